use crate::domain::account::{Account, AccountId};
use crate::domain::ports::{AccountStoreBox, TransferStoreBox};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Read-only aggregates over the ledger. These impose no invariant on the
/// transfer core beyond read consistency.
pub struct Reports {
    accounts: AccountStoreBox,
    transfers: TransferStoreBox,
}

/// Total value one account has sent, across the whole ledger.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct SenderTotal {
    pub account: AccountId,
    pub name: String,
    pub email: String,
    pub total_sent: Decimal,
}

/// Average outgoing transfer per sender, with the count for context.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct SenderAverage {
    pub account: AccountId,
    pub name: String,
    pub email: String,
    pub average_sent: Decimal,
    pub transfer_count: u64,
}

impl Reports {
    pub fn new(accounts: AccountStoreBox, transfers: TransferStoreBox) -> Self {
        Self {
            accounts,
            transfers,
        }
    }

    /// Sum of sent amounts grouped by sender, largest first. Accounts with
    /// no outgoing transfers are omitted.
    pub async fn total_sent_per_sender(&self) -> Result<Vec<SenderTotal>> {
        let by_sender = self.sums_by_sender().await?;
        let directory = self.directory().await?;

        let mut totals: Vec<SenderTotal> = by_sender
            .into_iter()
            .map(|(account, (total, _count))| {
                let (name, email) = contact(&directory, account);
                SenderTotal {
                    account,
                    name,
                    email,
                    total_sent: total,
                }
            })
            .collect();
        totals.sort_by(|a, b| b.total_sent.cmp(&a.total_sent));
        Ok(totals)
    }

    /// Average sent amount grouped by sender, rounded to two places,
    /// largest first.
    pub async fn average_sent_per_sender(&self) -> Result<Vec<SenderAverage>> {
        let by_sender = self.sums_by_sender().await?;
        let directory = self.directory().await?;

        let mut averages: Vec<SenderAverage> = by_sender
            .into_iter()
            .map(|(account, (total, count))| {
                let (name, email) = contact(&directory, account);
                SenderAverage {
                    account,
                    name,
                    email,
                    average_sent: (total / Decimal::from(count)).round_dp(2),
                    transfer_count: count,
                }
            })
            .collect();
        averages.sort_by(|a, b| b.average_sent.cmp(&a.average_sent));
        Ok(averages)
    }

    async fn sums_by_sender(&self) -> Result<BTreeMap<AccountId, (Decimal, u64)>> {
        let mut by_sender: BTreeMap<AccountId, (Decimal, u64)> = BTreeMap::new();
        for record in self.transfers.all_records().await? {
            let entry = by_sender
                .entry(record.sender)
                .or_insert((Decimal::ZERO, 0));
            entry.0 += record.amount.value();
            entry.1 += 1;
        }
        Ok(by_sender)
    }

    async fn directory(&self) -> Result<HashMap<AccountId, Account>> {
        Ok(self
            .accounts
            .all_accounts()
            .await?
            .into_iter()
            .map(|account| (account.id, account))
            .collect())
    }
}

fn contact(directory: &HashMap<AccountId, Account>, id: AccountId) -> (String, String) {
    match directory.get(&id) {
        Some(account) => (account.name.clone(), account.email.clone()),
        None => ("unknown".to_string(), "n/a".to_string()),
    }
}
