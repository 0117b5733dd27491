use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::ports::{AccountStore, TransferStore, TransferUnit};
use crate::domain::transfer::{TransferDraft, TransferRecord};
use crate::error::{Result, WalletError};
use crate::infrastructure::locks::AccountLocks;
use async_trait::async_trait;
use chrono::NaiveDate;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Duration;

/// Column Family for account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for the transfer ledger.
pub const CF_TRANSFERS: &str = "transfers";
/// Column Family mapping email -> account id.
pub const CF_EMAILS: &str = "emails";
/// Column Family for id counters.
pub const CF_META: &str = "meta";

const META_LAST_ACCOUNT_ID: &[u8] = b"last_account_id";
const META_LAST_RECORD_ID: &[u8] = b"last_record_id";

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A persistent store implementation using RocksDB.
///
/// Accounts, the ledger and the email index live in separate Column
/// Families; a transfer unit's staged effects land in a single `WriteBatch`
/// so the commit is all-or-nothing. The per-account locks are in-process:
/// the store assumes a single writer process, matching the CLI.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    next_account_id: Arc<AtomicU64>,
    next_record_id: Arc<AtomicU64>,
    locks: Arc<AccountLocks>,
    // Serializes read-modify-write commits so concurrent credits to the
    // same recipient cannot lose updates.
    write_lock: Arc<AsyncMutex<()>>,
    lock_timeout: Duration,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist and restoring the id counters.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ACCOUNTS, CF_TRANSFERS, CF_EMAILS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        let store = Self {
            db: Arc::new(db),
            next_account_id: Arc::new(AtomicU64::new(0)),
            next_record_id: Arc::new(AtomicU64::new(0)),
            locks: Arc::new(AccountLocks::new()),
            write_lock: Arc::new(AsyncMutex::new(())),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        };
        store
            .next_account_id
            .store(store.read_counter(META_LAST_ACCOUNT_ID)?, Ordering::SeqCst);
        store
            .next_record_id
            .store(store.read_counter(META_LAST_RECORD_ID)?, Ordering::SeqCst);

        tracing::info!(
            accounts = store.next_account_id.load(Ordering::SeqCst),
            records = store.next_record_id.load(Ordering::SeqCst),
            "opened wallet database"
        );
        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| WalletError::Persistence(format!("{name} column family missing")))
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        match self.db.get_cf(self.cf(CF_META)?, key)? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn load_account(&self, id: AccountId) -> Result<Option<Account>> {
        match self.db.get_cf(self.cf(CF_ACCOUNTS)?, id.value().to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| WalletError::Persistence("malformed counter value".to_string()))?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn insert(&self, name: &str, email: &str, balance: Balance) -> Result<Account> {
        if balance.0 < Decimal::ZERO {
            return Err(WalletError::InvalidAmount);
        }
        let _write = self.write_lock.lock().await;

        if self.db.get_cf(self.cf(CF_EMAILS)?, email.as_bytes())?.is_some() {
            return Err(WalletError::EmailTaken(email.to_string()));
        }

        let id = self.next_account_id.fetch_add(1, Ordering::SeqCst) + 1;
        let account = Account::new(AccountId::new(id), name, email, balance);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_ACCOUNTS)?,
            id.to_be_bytes(),
            serde_json::to_vec(&account)?,
        );
        batch.put_cf(self.cf(CF_EMAILS)?, email.as_bytes(), id.to_be_bytes());
        batch.put_cf(self.cf(CF_META)?, META_LAST_ACCOUNT_ID, id.to_be_bytes());
        self.db.write(batch)?;

        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.load_account(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        match self.db.get_cf(self.cf(CF_EMAILS)?, email.as_bytes())? {
            Some(bytes) => self.load_account(AccountId::new(decode_u64(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();
        // Keys are big-endian ids, so iteration order is id order.
        for item in self.db.iterator_cf(self.cf(CF_ACCOUNTS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }

    async fn begin_transfer(&self) -> Result<Box<dyn TransferUnit>> {
        Ok(Box::new(RocksDBUnit {
            store: self.clone(),
            _guard: None,
            staged: HashMap::new(),
            draft: None,
        }))
    }
}

#[async_trait]
impl TransferStore for RocksDBStore {
    async fn get_record(&self, id: u64) -> Result<Option<TransferRecord>> {
        match self.db.get_cf(self.cf(CF_TRANSFERS)?, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn sent_on(&self, sender: AccountId, day: NaiveDate) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for item in self.db.iterator_cf(self.cf(CF_TRANSFERS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let record: TransferRecord = serde_json::from_slice(&value)?;
            if record.sender == sender && record.created_at.date_naive() == day {
                total += record.amount.value();
            }
        }
        Ok(total)
    }

    async fn history(&self, account: AccountId) -> Result<Vec<TransferRecord>> {
        let mut records = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_TRANSFERS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let record: TransferRecord = serde_json::from_slice(&value)?;
            if record.sender == account || record.recipient == account {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn all_records(&self) -> Result<Vec<TransferRecord>> {
        let mut records = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_TRANSFERS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

/// Staged unit of work over a [`RocksDBStore`].
///
/// Deltas accumulate locally; `commit` folds them, together with the ledger
/// entry and the record counter, into one `WriteBatch`.
struct RocksDBUnit {
    store: RocksDBStore,
    // Held for RAII only: released when the unit commits or is dropped.
    _guard: Option<OwnedMutexGuard<()>>,
    staged: HashMap<AccountId, Decimal>,
    draft: Option<TransferDraft>,
}

impl RocksDBUnit {
    fn staged_balance(&self, id: AccountId) -> Result<Decimal> {
        let account = self
            .store
            .load_account(id)?
            .ok_or(WalletError::AccountNotFound(id))?;
        let delta = self.staged.get(&id).copied().unwrap_or(Decimal::ZERO);
        Ok(account.balance.0 + delta)
    }
}

#[async_trait]
impl TransferUnit for RocksDBUnit {
    async fn lock_sender(&mut self, id: AccountId) -> Result<Account> {
        let guard = self.store.locks.acquire(id, self.store.lock_timeout).await?;
        self._guard = Some(guard);
        self.store
            .load_account(id)?
            .ok_or(WalletError::AccountNotFound(id))
    }

    async fn debit(&mut self, id: AccountId, amount: Amount) -> Result<()> {
        if self.staged_balance(id)? < amount.value() {
            return Err(WalletError::InsufficientFunds);
        }
        *self.staged.entry(id).or_insert(Decimal::ZERO) -= amount.value();
        Ok(())
    }

    async fn credit(&mut self, id: AccountId, amount: Amount) -> Result<()> {
        // Existence check only; credits cannot go negative.
        self.staged_balance(id)?;
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

        let _write = self.store.write_lock.lock().await;

        let mut batch = WriteBatch::default();
        for (id, delta) in &self.staged {
            let mut account = self
                .store
                .load_account(*id)?
                .ok_or(WalletError::AccountNotFound(*id))?;
            let next = account.balance.0 + *delta;
            if next < Decimal::ZERO {
                return Err(WalletError::InsufficientFunds);
            }
            account.balance.0 = next;
            batch.put_cf(
                self.store.cf(CF_ACCOUNTS)?,
                id.value().to_be_bytes(),
                serde_json::to_vec(&account)?,
            );
        }

        let id = self.store.next_record_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = draft.into_record(id);
        batch.put_cf(
            self.store.cf(CF_TRANSFERS)?,
            id.to_be_bytes(),
            serde_json::to_vec(&record)?,
        );
        batch.put_cf(self.store.cf(CF_META)?, META_LAST_RECORD_ID, id.to_be_bytes());
        self.store.db.write(batch)?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.db.cf_handle(CF_TRANSFERS).is_some());
        assert!(store.db.cf_handle(CF_EMAILS).is_some());
        assert!(store.db.cf_handle(CF_META).is_some());
    }

    #[tokio::test]
    async fn test_account_roundtrip_and_email_index() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let alice = store
            .insert("Alice", "alice@example.com", Balance::new(dec!(100)))
            .await
            .unwrap();

        let by_id = store.get(alice.id).await.unwrap().unwrap();
        assert_eq!(by_id, alice);
        let by_email = store.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email, Some(alice));

        let err = store
            .insert("Impostor", "alice@example.com", Balance::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::EmailTaken(_)));
    }

    #[tokio::test]
    async fn test_unit_commit_is_atomic_and_persistent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet");

        let (alice_id, bob_id) = {
            let store = RocksDBStore::open(&path).unwrap();
            let alice = store
                .insert("Alice", "alice@example.com", Balance::new(dec!(100)))
                .await
                .unwrap();
            let bob = store
                .insert("Bob", "bob@example.com", Balance::new(dec!(50)))
                .await
                .unwrap();

            let amount = Amount::new(dec!(30)).unwrap();
            let mut unit = store.begin_transfer().await.unwrap();
            unit.lock_sender(alice.id).await.unwrap();
            unit.debit(alice.id, amount).await.unwrap();
            unit.credit(bob.id, amount).await.unwrap();
            unit.stage_record(TransferDraft::new(alice.id, bob.id, amount));
            let record = unit.commit().await.unwrap();
            assert_eq!(record.id, 1);
            (alice.id, bob.id)
        };

        // Reopen: balances, ledger and counters survive.
        let store = RocksDBStore::open(&path).unwrap();
        let alice = store.get(alice_id).await.unwrap().unwrap();
        let bob = store.get(bob_id).await.unwrap().unwrap();
        assert_eq!(alice.balance, Balance::new(dec!(70)));
        assert_eq!(bob.balance, Balance::new(dec!(80)));
        assert!(store.get_record(1).await.unwrap().is_some());

        let carol = store
            .insert("Carol", "carol@example.com", Balance::ZERO)
            .await
            .unwrap();
        assert_eq!(carol.id, AccountId::new(3));

        let amount = Amount::new(dec!(10)).unwrap();
        let mut unit = store.begin_transfer().await.unwrap();
        unit.lock_sender(alice_id).await.unwrap();
        unit.debit(alice_id, amount).await.unwrap();
        unit.credit(bob_id, amount).await.unwrap();
        unit.stage_record(TransferDraft::new(alice_id, bob_id, amount));
        let record = unit.commit().await.unwrap();
        assert_eq!(record.id, 2);
    }

    #[tokio::test]
    async fn test_dropped_unit_leaves_db_untouched() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let alice = store
            .insert("Alice", "alice@example.com", Balance::new(dec!(100)))
            .await
            .unwrap();
        let bob = store
            .insert("Bob", "bob@example.com", Balance::new(dec!(50)))
            .await
            .unwrap();

        {
            let mut unit = store.begin_transfer().await.unwrap();
            unit.lock_sender(alice.id).await.unwrap();
            unit.debit(alice.id, Amount::new(dec!(30)).unwrap())
                .await
                .unwrap();
            unit.credit(bob.id, Amount::new(dec!(30)).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(
            store.get(alice.id).await.unwrap().unwrap().balance,
            Balance::new(dec!(100))
        );
        assert!(store.all_records().await.unwrap().is_empty());
    }
}
