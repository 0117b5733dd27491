use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::ports::{AccountStore, TransferStore, TransferUnit};
use crate::domain::transfer::{TransferDraft, TransferRecord};
use crate::error::{Result, WalletError};
use crate::infrastructure::locks::AccountLocks;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{OwnedMutexGuard, RwLock};
use tokio::time::Duration;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A thread-safe in-memory wallet store.
///
/// Uses `Arc<RwLock<..>>` maps to allow shared concurrent access, plus a
/// per-account lock registry for the transfer serialization point. Ideal
/// for tests and the CLI's default mode, where persistence is not required.
#[derive(Clone)]
pub struct InMemoryStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
    records: Arc<RwLock<BTreeMap<u64, TransferRecord>>>,
    next_account_id: Arc<AtomicU64>,
    next_record_id: Arc<AtomicU64>,
    locks: Arc<AccountLocks>,
    lock_timeout: Duration,
}

impl InMemoryStore {
    /// Creates a new, empty store with the default lock timeout.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates a store whose transfer units give up on the sender lock
    /// after `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            records: Arc::new(RwLock::new(BTreeMap::new())),
            next_account_id: Arc::new(AtomicU64::new(0)),
            next_record_id: Arc::new(AtomicU64::new(0)),
            locks: Arc::new(AccountLocks::new()),
            lock_timeout,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert(&self, name: &str, email: &str, balance: Balance) -> Result<Account> {
        if balance.0 < Decimal::ZERO {
            return Err(WalletError::InvalidAmount);
        }
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == email) {
            return Err(WalletError::EmailTaken(email.to_string()));
        }
        let id = AccountId::new(self.next_account_id.fetch_add(1, Ordering::SeqCst) + 1);
        let account = Account::new(id, name, email, balance);
        accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by_key(|a| a.id);
        Ok(all)
    }

    async fn begin_transfer(&self) -> Result<Box<dyn TransferUnit>> {
        Ok(Box::new(InMemoryUnit {
            store: self.clone(),
            _guard: None,
            staged: HashMap::new(),
            draft: None,
        }))
    }
}

#[async_trait]
impl TransferStore for InMemoryStore {
    async fn get_record(&self, id: u64) -> Result<Option<TransferRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn sent_on(&self, sender: AccountId, day: NaiveDate) -> Result<Decimal> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.sender == sender && r.created_at.date_naive() == day)
            .map(|r| r.amount.value())
            .sum())
    }

    async fn history(&self, account: AccountId) -> Result<Vec<TransferRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.sender == account || r.recipient == account)
            .cloned()
            .collect())
    }

    async fn all_records(&self) -> Result<Vec<TransferRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}

/// Staged unit of work over an [`InMemoryStore`].
///
/// Deltas accumulate locally and only touch the shared maps in `commit`;
/// dropping the unit discards them and releases the sender lock.
struct InMemoryUnit {
    store: InMemoryStore,
    // Held for RAII only: released when the unit commits or is dropped.
    _guard: Option<OwnedMutexGuard<()>>,
    staged: HashMap<AccountId, Decimal>,
    draft: Option<TransferDraft>,
}

impl InMemoryUnit {
    async fn staged_balance(&self, id: AccountId) -> Result<Decimal> {
        let accounts = self.store.accounts.read().await;
        let account = accounts.get(&id).ok_or(WalletError::AccountNotFound(id))?;
        let delta = self.staged.get(&id).copied().unwrap_or(Decimal::ZERO);
        Ok(account.balance.0 + delta)
    }
}

#[async_trait]
impl TransferUnit for InMemoryUnit {
    async fn lock_sender(&mut self, id: AccountId) -> Result<Account> {
        let guard = self.store.locks.acquire(id, self.store.lock_timeout).await?;
        self._guard = Some(guard);
        let accounts = self.store.accounts.read().await;
        accounts
            .get(&id)
            .cloned()
            .ok_or(WalletError::AccountNotFound(id))
    }

    async fn debit(&mut self, id: AccountId, amount: Amount) -> Result<()> {
        if self.staged_balance(id).await? < amount.value() {
            return Err(WalletError::InsufficientFunds);
        }
        *self.staged.entry(id).or_insert(Decimal::ZERO) -= amount.value();
        Ok(())
    }

    async fn credit(&mut self, id: AccountId, amount: Amount) -> Result<()> {
        // Existence check only; credits cannot go negative.
        self.staged_balance(id).await?;
        *self.staged.entry(id).or_insert(Decimal::ZERO) += amount.value();
        Ok(())
    }

    fn stage_record(&mut self, draft: TransferDraft) {
        self.draft = Some(draft);
    }

    async fn commit(mut self: Box<Self>) -> Result<TransferRecord> {
        let draft = self
            .draft
            .take()
            .ok_or_else(|| WalletError::Persistence("no ledger entry staged".to_string()))?;

        let mut accounts = self.store.accounts.write().await;

        // Validate every staged delta before touching anything.
        for (id, delta) in &self.staged {
            let account = accounts.get(id).ok_or(WalletError::AccountNotFound(*id))?;
            if account.balance.0 + *delta < Decimal::ZERO {
                return Err(WalletError::InsufficientFunds);
            }
        }

        for (id, delta) in &self.staged {
            if let Some(account) = accounts.get_mut(id) {
                account.balance.0 += *delta;
            }
        }

        let id = self.store.next_record_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = draft.into_record(id);
        let mut records = self.store.records.write().await;
        records.insert(id, record.clone());
        Ok(record)
    }
}
