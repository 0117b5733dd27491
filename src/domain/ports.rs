use super::account::{Account, AccountId, Amount, Balance};
use super::transfer::{TransferDraft, TransferRecord};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type TransferStoreBox = Box<dyn TransferStore>;

/// Persistence port for account state.
///
/// Balances are only ever mutated through a [`TransferUnit`]; the plain
/// reads here are allowed to go stale between the read and any later lock
/// acquisition.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists a new account, assigning its id. Fails with `EmailTaken`
    /// when the email is already registered.
    async fn insert(&self, name: &str, email: &str, balance: Balance) -> Result<Account>;
    async fn get(&self, id: AccountId) -> Result<Option<Account>>;
    /// Recipient resolution read path.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    /// All accounts ordered by id, for reporting and export.
    async fn all_accounts(&self) -> Result<Vec<Account>>;
    /// Opens the atomic scope a transfer executes in.
    async fn begin_transfer(&self) -> Result<Box<dyn TransferUnit>>;
}

/// Read port over the transfer ledger.
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn get_record(&self, id: u64) -> Result<Option<TransferRecord>>;
    /// Sum of amounts the sender committed on the given UTC day.
    async fn sent_on(&self, sender: AccountId, day: NaiveDate) -> Result<Decimal>;
    /// Records the account appears in, as sender or recipient, ordered by id.
    async fn history(&self, account: AccountId) -> Result<Vec<TransferRecord>>;
    /// The whole ledger ordered by id, for reporting.
    async fn all_records(&self) -> Result<Vec<TransferRecord>>;
}

/// One transfer's atomic unit of work.
///
/// Effects staged on the unit become visible only at `commit`; dropping an
/// uncommitted unit discards them and releases any held lock. Concurrent
/// readers never observe a partially applied transfer.
#[async_trait]
pub trait TransferUnit: Send {
    /// Acquires the sender's exclusive lock for the rest of the unit and
    /// returns a balance reading taken under it. This is the transfer
    /// protocol's sole serialization point.
    async fn lock_sender(&mut self, id: AccountId) -> Result<Account>;
    /// Stages a balance decrease; fails with `InsufficientFunds` if the
    /// staged result would go negative.
    async fn debit(&mut self, id: AccountId, amount: Amount) -> Result<()>;
    /// Stages a balance increase.
    async fn credit(&mut self, id: AccountId, amount: Amount) -> Result<()>;
    /// Stages the ledger entry committed alongside the adjustments.
    fn stage_record(&mut self, draft: TransferDraft);
    /// Applies every staged effect atomically and assigns the record id.
    async fn commit(self: Box<Self>) -> Result<TransferRecord>;
}
