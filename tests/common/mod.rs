#![allow(dead_code)]

use rust_decimal::Decimal;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use wallet_core::application::engine::{EngineConfig, TransferEngine};
use wallet_core::domain::account::{Balance, Identity};
use wallet_core::domain::ports::AccountStore;
use wallet_core::infrastructure::in_memory::InMemoryStore;

pub async fn seed_account(
    store: &InMemoryStore,
    name: &str,
    email: &str,
    balance: Decimal,
) -> Identity {
    let account = store
        .insert(name, email, Balance::new(balance))
        .await
        .unwrap();
    Identity {
        id: account.id,
        email: account.email,
    }
}

pub fn engine_for(store: &InMemoryStore) -> TransferEngine {
    TransferEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        EngineConfig::default(),
    )
}

pub fn engine_with_limit(store: &InMemoryStore, daily_limit: Decimal) -> TransferEngine {
    TransferEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        EngineConfig { daily_limit },
    )
}

pub fn write_accounts_csv(path: &Path, rows: &[(&str, &str, &str)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["name", "email", "balance"])?;
    for (name, email, balance) in rows {
        wtr.write_record([*name, *email, *balance])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_transfers_csv(path: &Path, rows: &[(&str, &str, &str)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["sender", "recipient", "amount"])?;
    for (sender, recipient, amount) in rows {
        wtr.write_record([*sender, *recipient, *amount])?;
    }
    wtr.flush()?;
    Ok(())
}
