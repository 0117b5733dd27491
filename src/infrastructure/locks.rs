use crate::domain::account::AccountId;
use crate::error::{Result, WalletError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::{Duration, timeout};

/// Per-account exclusive locks backing the transfer serialization point.
///
/// Entries are created on first use and keyed by account, so transfers from
/// different senders never contend here. A transfer acquires at most one of
/// these locks, which rules out ordering cycles.
#[derive(Default)]
pub struct AccountLocks {
    entries: Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: AccountId) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().expect("lock registry poisoned");
        entries.entry(id).or_default().clone()
    }

    /// Acquires the exclusive lock for one account, failing with
    /// `ConcurrencyConflict` once `wait` elapses.
    pub async fn acquire(&self, id: AccountId, wait: Duration) -> Result<OwnedMutexGuard<()>> {
        let entry = self.entry(id);
        timeout(wait, entry.lock_owned())
            .await
            .map_err(|_| WalletError::ConcurrencyConflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_is_exclusive_per_account() {
        let locks = AccountLocks::new();
        let id = AccountId::new(1);

        let guard = locks.acquire(id, Duration::from_millis(50)).await.unwrap();

        let blocked = locks.acquire(id, Duration::from_millis(50)).await;
        assert!(matches!(blocked, Err(WalletError::ConcurrencyConflict)));

        drop(guard);
        assert!(locks.acquire(id, Duration::from_millis(50)).await.is_ok());
    }

    #[tokio::test]
    async fn test_distinct_accounts_do_not_contend() {
        let locks = AccountLocks::new();

        let _one = locks
            .acquire(AccountId::new(1), Duration::from_millis(50))
            .await
            .unwrap();
        let _two = locks
            .acquire(AccountId::new(2), Duration::from_millis(50))
            .await
            .unwrap();
    }
}
