use crate::domain::account::{AccountId, Amount, Balance};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default cap on total outgoing value per sender per calendar day.
pub const DEFAULT_DAILY_LIMIT: Decimal = dec!(5000);

/// Validation rules for a transfer.
///
/// Every rule is a pure predicate over inputs the orchestrator supplies;
/// the policy never reads storage, so each rule is testable with literal
/// values. The `sent_today` aggregate in particular is computed by the
/// caller from the ledger.
#[derive(Debug, Clone)]
pub struct TransferPolicy {
    daily_limit: Decimal,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_LIMIT)
    }
}

impl TransferPolicy {
    pub fn new(daily_limit: Decimal) -> Self {
        Self { daily_limit }
    }

    pub fn daily_limit(&self) -> Decimal {
        self.daily_limit
    }

    /// Rejects non-positive or sub-cent amounts.
    pub fn validate_amount(&self, amount: Decimal) -> Result<Amount> {
        Amount::new(amount)
    }

    /// A sender can never be their own recipient.
    pub fn validate_self_transfer(&self, sender: AccountId, recipient: AccountId) -> Result<()> {
        if sender == recipient {
            return Err(WalletError::SelfTransferNotAllowed);
        }
        Ok(())
    }

    /// Caps the sender's outgoing volume for the current day.
    ///
    /// The error carries limit, sent and remaining values so callers can
    /// render actionable feedback.
    pub fn validate_daily_limit(&self, amount: Amount, sent_today: Decimal) -> Result<()> {
        if sent_today + amount.value() > self.daily_limit {
            return Err(WalletError::DailyLimitExceeded {
                limit: self.daily_limit,
                sent_today,
                remaining: self.daily_limit - sent_today,
            });
        }
        Ok(())
    }

    /// Balance check against a supplied reading.
    ///
    /// Cheap pre-check when called with an unlocked read; authoritative when
    /// the reading was taken under the sender's lock.
    pub fn validate_sufficient_balance(&self, balance: Balance, amount: Amount) -> Result<()> {
        if balance.0 < amount.value() {
            return Err(WalletError::InsufficientFunds);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(value: Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn test_self_transfer_rejected() {
        let policy = TransferPolicy::default();
        assert!(matches!(
            policy.validate_self_transfer(AccountId::new(1), AccountId::new(1)),
            Err(WalletError::SelfTransferNotAllowed)
        ));
        assert!(
            policy
                .validate_self_transfer(AccountId::new(1), AccountId::new(2))
                .is_ok()
        );
    }

    #[test]
    fn test_daily_limit_reports_remaining() {
        let policy = TransferPolicy::default();

        let err = policy
            .validate_daily_limit(amount(dec!(200)), dec!(4900))
            .unwrap_err();
        match err {
            WalletError::DailyLimitExceeded {
                limit,
                sent_today,
                remaining,
            } => {
                assert_eq!(limit, dec!(5000));
                assert_eq!(sent_today, dec!(4900));
                assert_eq!(remaining, dec!(100));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_daily_limit_boundary_is_inclusive() {
        let policy = TransferPolicy::default();
        // Landing exactly on the limit is allowed; crossing it is not.
        assert!(
            policy
                .validate_daily_limit(amount(dec!(100)), dec!(4900))
                .is_ok()
        );
        assert!(
            policy
                .validate_daily_limit(amount(dec!(100.01)), dec!(4900))
                .is_err()
        );
    }

    #[test]
    fn test_custom_limit() {
        let policy = TransferPolicy::new(dec!(100));
        assert!(
            policy
                .validate_daily_limit(amount(dec!(100)), Decimal::ZERO)
                .is_ok()
        );
        assert!(
            policy
                .validate_daily_limit(amount(dec!(100.01)), Decimal::ZERO)
                .is_err()
        );
    }

    #[test]
    fn test_sufficient_balance() {
        let policy = TransferPolicy::default();
        assert!(
            policy
                .validate_sufficient_balance(Balance::new(dec!(100)), amount(dec!(100)))
                .is_ok()
        );
        assert!(matches!(
            policy.validate_sufficient_balance(Balance::new(dec!(99.99)), amount(dec!(100))),
            Err(WalletError::InsufficientFunds)
        ));
    }

    #[test]
    fn test_amount_validation_delegates() {
        let policy = TransferPolicy::default();
        assert!(policy.validate_amount(dec!(10.55)).is_ok());
        assert!(matches!(
            policy.validate_amount(dec!(0)),
            Err(WalletError::InvalidAmount)
        ));
    }
}
