use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use stars_ledger::application::engine::StarsEngine;
use stars_ledger::config::Settings;
use stars_ledger::domain::ports::{AccountStoreBox, PendingPaymentStoreBox, RefundGatewayBox};
use stars_ledger::infrastructure::in_memory::{InMemoryAccountStore, InMemoryPendingPaymentStore};
use stars_ledger::infrastructure::offline::OfflineRefundGateway;
use stars_ledger::infrastructure::telegram::TelegramClient;
use stars_ledger::interfaces::bot::handler::CommandHandler;
use stars_ledger::interfaces::bot::shell::BotShell;
use stars_ledger::interfaces::csv::balance_writer::BalanceWriter;
use stars_ledger::interfaces::csv::event_reader::EventReader;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a CSV of ledger events and print the resulting balances
    Replay {
        /// Input events CSV file
        input: PathBuf,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Run the Telegram bot
    Serve {
        /// Bot API token
        #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
        token: String,

        /// Payment provider token sent with invoices
        #[arg(long, env = "PROVIDER_TOKEN", hide_env_values = true)]
        provider_token: Option<String>,

        /// YAML settings file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { input, db_path } => replay(input, db_path).await,
        Commands::Serve {
            token,
            provider_token,
            config,
            db_path,
        } => serve(token, provider_token, config, db_path).await,
    }
}

async fn replay(input: PathBuf, db_path: Option<PathBuf>) -> Result<()> {
    let (accounts, pending) = open_stores(db_path)?;
    let refunds: RefundGatewayBox = Box::new(OfflineRefundGateway);
    let engine = StarsEngine::new(accounts, pending, refunds);

    let file = File::open(input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event in reader.events() {
        match event {
            Ok(event) => {
                if let Err(e) = event.apply(&engine).await {
                    tracing::warn!("Error processing event: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Error reading event: {}", e);
            }
        }
    }

    let rows = engine.snapshot().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_snapshots(&rows).into_diagnostic()?;

    Ok(())
}

async fn serve(
    token: String,
    provider_token: Option<String>,
    config: Option<PathBuf>,
    db_path: Option<PathBuf>,
) -> Result<()> {
    let settings = Settings::load_or_default(config.as_deref()).into_diagnostic()?;
    let (accounts, pending) = open_stores(db_path)?;
    let client = TelegramClient::new(token, provider_token);

    let engine = Arc::new(
        StarsEngine::new(accounts, pending, Box::new(client.clone()))
            .with_refund_timeout(settings.refund_timeout()),
    );
    let handler = CommandHandler::new(engine.clone(), Box::new(client.clone()), settings.invoice);

    BotShell::new(Box::new(client), engine, handler, settings.poll_timeout_secs)
        .run()
        .await;
    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(AccountStoreBox, PendingPaymentStoreBox)> {
    use stars_ledger::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = db_path {
        let store = RocksDBStore::open(&db_path).into_diagnostic()?;
        tracing::info!(path = %db_path.display(), "using persistent RocksDB storage");
        return Ok((Box::new(store.clone()), Box::new(store)));
    }
    Ok(in_memory_stores())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(AccountStoreBox, PendingPaymentStoreBox)> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (AccountStoreBox, PendingPaymentStoreBox) {
    tracing::debug!("using volatile in-memory storage");
    (
        Box::new(InMemoryAccountStore::new()),
        Box::new(InMemoryPendingPaymentStore::new()),
    )
}
