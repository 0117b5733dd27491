use crate::domain::account::{AccountId, Amount, Balance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable ledger entry documenting one completed value movement.
///
/// Created exactly once per successful transfer, inside the same atomic
/// scope as the two balance adjustments; never updated afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransferRecord {
    /// Monotonic id assigned by storage at commit.
    pub id: u64,
    /// Globally unique reference for idempotency and audit correlation.
    pub external_ref: Uuid,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Amount,
    /// Commit-time timestamp; basis of the daily-limit window (UTC days).
    pub created_at: DateTime<Utc>,
}

/// Ledger entry awaiting its storage id.
///
/// Built inside the transfer's atomic scope and staged on the unit; the
/// store turns it into a [`TransferRecord`] when the unit commits.
#[derive(Debug, Clone)]
pub struct TransferDraft {
    pub external_ref: Uuid,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl TransferDraft {
    /// Creates the entry with a fresh external reference, stamped now.
    pub fn new(sender: AccountId, recipient: AccountId, amount: Amount) -> Self {
        debug_assert_ne!(sender, recipient);
        Self {
            external_ref: Uuid::new_v4(),
            sender,
            recipient,
            amount,
            created_at: Utc::now(),
        }
    }

    pub fn into_record(self, id: u64) -> TransferRecord {
        TransferRecord {
            id,
            external_ref: self.external_ref,
            sender: self.sender,
            recipient: self.recipient,
            amount: self.amount,
            created_at: self.created_at,
        }
    }
}

/// Outcome of a committed transfer: the ledger entry plus the sender's
/// balance movement, for caller-side observability.
#[derive(Debug, Serialize, Clone)]
pub struct TransferReceipt {
    pub record: TransferRecord,
    pub balance_before: Balance,
    pub balance_after: Balance,
}
