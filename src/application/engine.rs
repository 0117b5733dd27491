use crate::domain::account::{AccountId, Balance, Identity};
use crate::domain::policy::{DEFAULT_DAILY_LIMIT, TransferPolicy};
use crate::domain::ports::{AccountStoreBox, TransferStoreBox};
use crate::domain::transfer::{TransferDraft, TransferReceipt};
use crate::error::{Result, WalletError};
use chrono::Utc;
use rust_decimal::Decimal;

/// Tunable knobs for the transfer engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on total outgoing value per sender per UTC calendar day.
    pub daily_limit: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

/// The main entry point for moving value between accounts.
///
/// `TransferEngine` composes the transfer policy, the account store and the
/// ledger into one atomic unit of work per request. It owns the storage
/// backends; many requests may run concurrently against the same engine,
/// serialized only at the sender's lock.
pub struct TransferEngine {
    accounts: AccountStoreBox,
    transfers: TransferStoreBox,
    policy: TransferPolicy,
}

impl TransferEngine {
    pub fn new(accounts: AccountStoreBox, transfers: TransferStoreBox, config: EngineConfig) -> Self {
        Self {
            accounts,
            transfers,
            policy: TransferPolicy::new(config.daily_limit),
        }
    }

    /// Moves `amount` from the authenticated sender to the account
    /// registered under `recipient_email`.
    ///
    /// On success both balances, and the ledger, have been updated
    /// atomically and the receipt carries the new record. On any failure
    /// nothing was applied and the error names the specific kind.
    pub async fn transfer(
        &self,
        sender: &Identity,
        recipient_email: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt> {
        // Cheap, lock-free rejects first.
        let amount = self.policy.validate_amount(amount)?;
        let recipient = self
            .accounts
            .find_by_email(recipient_email)
            .await?
            .ok_or(WalletError::RecipientNotFound)?;
        self.policy.validate_self_transfer(sender.id, recipient.id)?;

        let sent_today = self
            .transfers
            .sent_on(sender.id, Utc::now().date_naive())
            .await?;
        self.policy.validate_daily_limit(amount, sent_today)?;

        // Fast-fail only: this reading may be stale by the time the lock is
        // held, so it never authorizes the debit on its own.
        let unlocked = self
            .accounts
            .get(sender.id)
            .await?
            .ok_or(WalletError::AccountNotFound(sender.id))?;
        self.policy
            .validate_sufficient_balance(unlocked.balance, amount)?;

        let mut unit = self.accounts.begin_transfer().await?;
        let locked = unit.lock_sender(sender.id).await?;
        tracing::debug!(sender = %sender.id, "sender lock acquired");

        // Authoritative re-check: transfers from this sender serialize on
        // the lock, so this reading cannot go stale before commit.
        self.policy
            .validate_sufficient_balance(locked.balance, amount)?;

        let balance_before = locked.balance;
        unit.debit(sender.id, amount).await?;
        unit.credit(recipient.id, amount).await?;
        unit.stage_record(TransferDraft::new(sender.id, recipient.id, amount));
        let record = unit.commit().await?;

        tracing::info!(
            sender = %sender.id,
            recipient = %recipient.id,
            amount = %amount,
            external_ref = %record.external_ref,
            "transfer committed"
        );

        Ok(TransferReceipt {
            record,
            balance_before,
            balance_after: balance_before - Balance::from(amount),
        })
    }

    /// Total amount the sender has committed within the current UTC day.
    pub async fn sent_today(&self, sender: AccountId) -> Result<Decimal> {
        self.transfers
            .sent_on(sender, Utc::now().date_naive())
            .await
    }
}
