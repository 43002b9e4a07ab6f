use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradeledger::{
    config::Settings,
    db::MongoTradeStore,
    IngestError, IngestPolicy, TimeZoneMode, TradeLedger,
};

#[derive(Parser, Debug)]
#[command(name = "upload")]
#[command(about = "Load a CSV file of trades into the trade store", long_about = None)]
struct Args {
    /// CSV file with User_ID,UTC_Time,Operation,Market,Buy/Sell Amount,Price columns
    file: PathBuf,

    /// Database URL (or use MONGODB_URL env var)
    #[arg(short, long)]
    database_url: Option<String>,

    /// Update database (if not set, only print data)
    #[arg(long)]
    update: bool,

    /// Interpret UTC_Time as UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Store nothing if any row is rejected
    #[arg(long)]
    abort_on_error: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradeledger=info,upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut settings = Settings::from_env()?;
    if args.database_url.is_some() {
        settings.database_url = args.database_url;
    }
    if args.utc {
        settings.time_zone = TimeZoneMode::Utc;
    }
    if args.abort_on_error {
        settings.ingest_policy = IngestPolicy::AbortOnFirstError;
    }

    info!(
        "Uploading {} (time zone: {}, policy: {:?})",
        args.file.display(),
        settings.time_zone,
        settings.ingest_policy
    );

    let store = if args.update {
        let database_url = settings.require_database_url()?;
        MongoTradeStore::new(database_url, &settings.database_name, &settings.collection, true).await?
    } else {
        // Dummy store for printing only
        MongoTradeStore::new("", &settings.database_name, &settings.collection, false).await?
    };

    let ledger = TradeLedger::new(Arc::new(store), settings.time_zone, settings.ingest_policy);
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    match ledger.ingest_csv(file).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            if args.update {
                println!("File uploaded and data saved to database!");
            } else {
                println!("Dry run: {} trades normalized, nothing written (use --update)", report.accepted);
            }
            Ok(())
        }
        Err(IngestError::Rejected { line, reason }) => {
            error!("Upload aborted at line {}: {}", line, reason);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Upload failed: {}", e);
            Err(e.into())
        }
    }
}
