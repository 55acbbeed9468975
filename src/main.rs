use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rust_bhav::data_collector::{today_ist, DataCollector, SyncOptions};
use rust_bhav::database_sqlx::DatabaseManagerSqlx;
use rust_bhav::models::{Config, Exchange};
use rust_bhav::pipeline::ListedCompanies;

/// Date format accepted on the command line, e.g. 02-Jan-2023
const CLI_DATE_FORMAT: &str = "%d-%b-%Y";

#[derive(Parser, Debug)]
#[command(author, version, about = "Sync BSE and NSE daily equity reports into SQLite", long_about = None)]
struct Args {
    /// Database file to sync to (overrides DATABASE_PATH)
    #[arg(long = "sync", value_name = "FILE")]
    database: Option<String>,

    /// BSE "List of Scrips" CSV export (overrides BSE_LISTED_COMPANIES)
    #[arg(long, value_name = "FILE")]
    listed_companies: Option<PathBuf>,

    /// Earliest date to fetch, e.g. 02-Jan-2023
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last date to fetch (defaults to today in IST)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Only sync the given exchanges
    #[arg(long = "exchange", value_parser = parse_exchange)]
    exchanges: Vec<Exchange>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, CLI_DATE_FORMAT).map_err(|e| format!("expected DD-Mon-YYYY: {}", e))
}

fn parse_exchange(s: &str) -> Result<Exchange, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "rust_bhav=debug" } else { "rust_bhav=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn load_listed_companies(path: Option<&Path>) -> Result<ListedCompanies> {
    let companies = match path {
        Some(path) => ListedCompanies::from_path(path)
            .with_context(|| format!("failed to load listed companies from {}", path.display()))?,
        None => {
            let companies = ListedCompanies::bundled().context("failed to load bundled reference data")?;
            warn!(
                companies = companies.len(),
                "using the bundled list of listed companies; set BSE_LISTED_COMPANIES to a full export"
            );
            companies
        }
    };
    info!(companies = companies.len(), "loaded list of listed companies");
    Ok(companies)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        error!(error = %format!("{:#}", e), "sync aborted");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(database) = args.database {
        config.database_path = database;
    }

    if let Some(path) = args.listed_companies {
        config.listed_companies_path = Some(path);
    }

    // every BSE parse depends on it; refuse to start without it
    let companies = load_listed_companies(config.listed_companies_path.as_deref())?;

    let database = Arc::new(DatabaseManagerSqlx::new(&config.database_path).await?);

    let options = SyncOptions {
        end: args.to.unwrap_or_else(today_ist),
        from: args.from,
        exchanges: if args.exchanges.is_empty() {
            Exchange::ALL.to_vec()
        } else {
            args.exchanges
        },
    };

    let collector = DataCollector::new(Arc::clone(&database), &config, Arc::new(companies))?;
    let report = collector.run(&options).await?;

    info!(
        exchanges = ?report.exchanges_synced,
        records = report.records_written,
        "✅ sync finished"
    );

    database.close().await;
    Ok(())
}
