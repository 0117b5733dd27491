use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use wallet_core::application::engine::{EngineConfig, TransferEngine};
use wallet_core::application::reports::Reports;
use wallet_core::domain::account::{Balance, Identity};
use wallet_core::domain::ports::{AccountStore, TransferStore};
use wallet_core::error::WalletError;
use wallet_core::infrastructure::in_memory::InMemoryStore;
#[cfg(feature = "storage-rocksdb")]
use wallet_core::infrastructure::rocksdb::RocksDBStore;
use wallet_core::interfaces::csv::account_reader::AccountReader;
use wallet_core::interfaces::csv::balance_writer::BalanceWriter;
use wallet_core::interfaces::csv::transfer_reader::TransferReader;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportKind {
    Totals,
    Averages,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account seed CSV file (name,email,balance)
    accounts: PathBuf,

    /// Transfer requests CSV file (sender,recipient,amount)
    transfers: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Cap on outgoing value per sender per day
    #[arg(long)]
    daily_limit: Option<Decimal>,

    /// Print a report as JSON instead of the balances CSV
    #[arg(long, value_enum)]
    report: Option<ReportKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = cli.db_path.clone() {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return run(store, cli).await;
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if cli.db_path.is_some() {
        miette::bail!("--db-path requires a build with the storage-rocksdb feature");
    }

    run(InMemoryStore::new(), cli).await
}

async fn run<S>(store: S, cli: Cli) -> Result<()>
where
    S: AccountStore + TransferStore + Clone + 'static,
{
    let mut config = EngineConfig::default();
    if let Some(limit) = cli.daily_limit {
        config.daily_limit = limit;
    }
    let engine = TransferEngine::new(Box::new(store.clone()), Box::new(store.clone()), config);

    seed_accounts(&store, &cli.accounts).await?;
    process_transfers(&engine, &store, &cli.transfers).await?;

    match cli.report {
        Some(kind) => print_report(kind, &store).await?,
        None => {
            let accounts = store.all_accounts().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = BalanceWriter::new(stdout.lock()).into_diagnostic()?;
            writer.write_accounts(&accounts).into_diagnostic()?;
        }
    }

    Ok(())
}

async fn seed_accounts<S: AccountStore>(store: &S, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for row in AccountReader::new(file).rows() {
        match row {
            Ok(row) => {
                let seeded = store
                    .insert(&row.name, &row.email, Balance::new(row.balance))
                    .await;
                match seeded {
                    Ok(_) => {}
                    Err(WalletError::EmailTaken(email)) => {
                        // Re-running against a persistent store is expected.
                        tracing::debug!(%email, "account already exists, skipping seed row");
                    }
                    Err(e) => eprintln!("Error seeding account: {e}"),
                }
            }
            Err(e) => eprintln!("Error reading account row: {e}"),
        }
    }
    Ok(())
}

async fn process_transfers<S: AccountStore>(
    engine: &TransferEngine,
    directory: &S,
    path: &Path,
) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for row in TransferReader::new(file).rows() {
        match row {
            Ok(row) => {
                // The directory lookup stands in for the identity provider:
                // the resolved identity, not the row, names the sender.
                let sender = match directory.find_by_email(&row.sender).await {
                    Ok(Some(account)) => Identity {
                        id: account.id,
                        email: account.email,
                    },
                    Ok(None) => {
                        eprintln!("Error processing transfer: unknown sender {}", row.sender);
                        continue;
                    }
                    Err(e) => {
                        eprintln!("Error processing transfer: {e}");
                        continue;
                    }
                };
                if let Err(e) = engine.transfer(&sender, &row.recipient, row.amount).await {
                    eprintln!("Error processing transfer: {e}");
                }
            }
            Err(e) => eprintln!("Error reading transfer: {e}"),
        }
    }
    Ok(())
}

async fn print_report<S>(kind: ReportKind, store: &S) -> Result<()>
where
    S: AccountStore + TransferStore + Clone + 'static,
{
    let reports = Reports::new(Box::new(store.clone()), Box::new(store.clone()));
    let json = match kind {
        ReportKind::Totals => {
            let totals = reports.total_sent_per_sender().await.into_diagnostic()?;
            serde_json::to_string_pretty(&totals).into_diagnostic()?
        }
        ReportKind::Averages => {
            let averages = reports.average_sent_per_sender().await.into_diagnostic()?;
            serde_json::to_string_pretty(&averages).into_diagnostic()?
        }
    };
    println!("{json}");
    Ok(())
}
