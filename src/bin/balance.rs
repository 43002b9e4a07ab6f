use anyhow::Result;
use clap::Parser;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradeledger::{config::Settings, db::MongoTradeStore, QueryError, TimeZoneMode, TradeLedger};

#[derive(Parser, Debug)]
#[command(name = "balance")]
#[command(about = "Print net asset balances from all trades before a cutoff", long_about = None)]
struct Args {
    /// Exclusive cutoff, e.g. "26-09-2022 12:00" or "2022-09-26T12:00:00Z"
    #[arg(short, long)]
    timestamp: Option<String>,

    /// Database URL (or use MONGODB_URL env var)
    #[arg(short, long)]
    database_url: Option<String>,

    /// Interpret cutoffs without an offset as UTC instead of local time
    #[arg(long)]
    utc: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradeledger=info,balance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut settings = Settings::from_env()?;
    if args.database_url.is_some() {
        settings.database_url = args.database_url;
    }
    if args.utc {
        settings.time_zone = TimeZoneMode::Utc;
    }

    let store = MongoTradeStore::new(
        settings.require_database_url()?,
        &settings.database_name,
        &settings.collection,
        true,
    )
    .await?;
    let ledger = TradeLedger::new(Arc::new(store), settings.time_zone, settings.ingest_policy);

    match ledger.compute_balances(args.timestamp.as_deref()).await {
        Ok(balances) => {
            let sorted: BTreeMap<_, _> = balances.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&sorted)?);
            Ok(())
        }
        Err(e @ QueryError::InvalidQuery(_)) => {
            error!("{}", e);
            std::process::exit(2);
        }
        Err(e) => {
            error!("Error retrieving asset balances: {}", e);
            Err(e.into())
        }
    }
}
