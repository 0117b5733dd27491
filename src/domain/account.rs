use crate::error::WalletError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Storage-assigned account identifier. Immutable for the account's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(u64);

impl AccountId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a stored monetary value with 2 decimal places precision.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for financial calculations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// Represents a positive monetary amount for transfers.
///
/// Ensures that transfer amounts are always positive and never carry more
/// precision than the stored balances (2 decimal places).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value <= Decimal::ZERO || value.normalize().scale() > 2 {
            return Err(WalletError::InvalidAmount);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement basic arithmetic for Balance to make it a usable Value Object
impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A user's stored balance, plus the directory fields the transfer flow
/// resolves recipients by.
///
/// The balance is only mutated through the store's transfer unit; reads made
/// outside a unit may be stale by the time a lock is held.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub balance: Balance,
}

impl Account {
    pub fn new(
        id: AccountId,
        name: impl Into<String>,
        email: impl Into<String>,
        balance: Balance,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            balance,
        }
    }

    /// Credits funds. A credit can never drive a balance negative.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    /// Debits funds if the balance covers them.
    pub fn debit(&mut self, amount: Amount) -> Result<(), WalletError> {
        if self.balance.0 < amount.value() {
            return Err(WalletError::InsufficientFunds);
        }
        self.balance -= amount.into();
        Ok(())
    }
}

/// The authenticated caller, as supplied by the identity provider.
///
/// Always passed explicitly to the transfer engine; the sender is never
/// derived from request payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: AccountId,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.0));
        assert_eq!(b1 + b2, Balance::new(dec!(15.0)));
        assert_eq!(b1 - b2, Balance::new(dec!(5.0)));
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(WalletError::InvalidAmount)
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(WalletError::InvalidAmount)
        ));
    }

    #[test]
    fn test_amount_rejects_sub_cent_precision() {
        assert!(matches!(
            Amount::new(dec!(0.001)),
            Err(WalletError::InvalidAmount)
        ));
        // Trailing zeros beyond two places are fine, the value is exact.
        assert!(Amount::new(dec!(1.100)).is_ok());
    }

    #[test]
    fn test_account_credit() {
        let mut account = Account::new(AccountId::new(1), "Alice", "alice@example.com", Balance::ZERO);
        account.credit(Amount::new(dec!(10.0)).unwrap());
        assert_eq!(account.balance, Balance::new(dec!(10.0)));
    }

    #[test]
    fn test_account_debit_success() {
        let mut account = Account::new(
            AccountId::new(1),
            "Alice",
            "alice@example.com",
            Balance::new(dec!(10.0)),
        );

        let result = account.debit(Amount::new(dec!(5.0)).unwrap());
        assert!(result.is_ok());
        assert_eq!(account.balance, Balance::new(dec!(5.0)));
    }

    #[test]
    fn test_account_debit_insufficient() {
        let mut account = Account::new(
            AccountId::new(1),
            "Alice",
            "alice@example.com",
            Balance::new(dec!(10.0)),
        );

        let result = account.debit(Amount::new(dec!(20.0)).unwrap());
        assert!(matches!(result, Err(WalletError::InsufficientFunds)));
        assert_eq!(account.balance, Balance::new(dec!(10.0)));
    }
}
