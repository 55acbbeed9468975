use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, warn};

use crate::models::{EquityRecord, Exchange};

const INSERT_EQUITY: &str = r#"
    INSERT OR REPLACE INTO equity (
        exchange, trading_date, ticker, type, isin_code,
        open, high, low, close, last, previous_close
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const LAST_TRADING_DATE: &str = "SELECT MAX(trading_date) FROM equity WHERE exchange = ?";

/// Where synced records go, and what has been synced so far
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquityStore: Send + Sync {
    /// Most recent trading date recorded for the exchange
    async fn last_trading_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>>;

    /// Persist one batch as a single unit of work; returns rows written
    async fn write_batch(&self, batch: &[EquityRecord]) -> Result<usize>;
}

/// SQLX-based database manager for synced equity data
#[derive(Clone)]
pub struct DatabaseManagerSqlx {
    pool: SqlitePool,
}

impl DatabaseManagerSqlx {
    /// Open (creating if missing) the database file and apply pending migrations
    pub async fn new(database_path: &str) -> Result<Self> {
        let path = database_path.strip_prefix("sqlite:").unwrap_or(database_path);
        info!(file = path, "opening database file");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database {}", path))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly useful for tests
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // a memory database lives and dies with its single connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply schema migrations")?;
        info!("database migrations completed successfully");

        Ok(Self { pool })
    }

    /// Number of records stored for an exchange
    pub async fn count_records(&self, exchange: Exchange) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM equity WHERE exchange = ?")
            .bind(exchange.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All records stored for an exchange on a date, ordered by ticker
    pub async fn records_on(&self, exchange: Exchange, date: NaiveDate) -> Result<Vec<EquityRecord>> {
        let rows: Vec<(String, String, String, f64, f64, f64, f64, f64, f64)> = sqlx::query_as(
            r#"
            SELECT ticker, type, isin_code, open, high, low, close, last, previous_close
            FROM equity WHERE exchange = ? AND trading_date = ?
            ORDER BY ticker
            "#,
        )
        .bind(exchange.as_str())
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(ticker, security_type, isin, open, high, low, close, last, previous_close)| EquityRecord {
                    exchange,
                    trading_date: date,
                    ticker,
                    security_type,
                    isin,
                    open,
                    high,
                    low,
                    close,
                    last,
                    previous_close,
                },
            )
            .collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl EquityStore for DatabaseManagerSqlx {
    async fn last_trading_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>> {
        let (last,): (Option<String>,) = sqlx::query_as(LAST_TRADING_DATE)
            .bind(exchange.as_str())
            .fetch_one(&self.pool)
            .await
            .context("failed to fetch sync information from database")?;

        last.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()
            .context("invalid trading date in database")
    }

    async fn write_batch(&self, batch: &[EquityRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for record in batch {
            let result = sqlx::query(INSERT_EQUITY)
                .bind(record.exchange.as_str())
                .bind(record.trading_date.format("%Y-%m-%d").to_string())
                .bind(&record.ticker)
                .bind(&record.security_type)
                .bind(&record.isin)
                .bind(record.open)
                .bind(record.high)
                .bind(record.low)
                .bind(record.close)
                .bind(record.last)
                .bind(record.previous_close)
                .execute(&mut tx)
                .await;

            match result {
                Ok(_) => written += 1,
                Err(e) => warn!(
                    exchange = %record.exchange,
                    date = %record.trading_date,
                    ticker = %record.ticker,
                    error = %e,
                    "failed to insert row"
                ),
            }
        }

        tx.commit().await?;
        Ok(written)
    }
}
