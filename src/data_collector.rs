use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate, Utc};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database_sqlx::EquityStore;
use crate::job_generator::spawn_generators;
use crate::models::{Config, Exchange};
use crate::pipeline::{EquityPipeline, EquityResource, EquitySource, ListedCompanies, PipelineConfig};
use crate::resume::SyncPlan;

/// Indian Standard Time, UTC+05:30
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Current calendar date at the exchanges
pub fn today_ist() -> NaiveDate {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => Utc::now().with_timezone(&ist).date_naive(),
        None => Utc::now().date_naive(),
    }
}

/// What to sync in one run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Last date to fetch, inclusive
    pub end: NaiveDate,
    /// User-requested start date, one of the resume candidates
    pub from: Option<NaiveDate>,
    pub exchanges: Vec<Exchange>,
}

impl SyncOptions {
    pub fn up_to(end: NaiveDate) -> Self {
        Self {
            end,
            from: None,
            exchanges: Exchange::ALL.to_vec(),
        }
    }
}

/// Outcome of a sync run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub exchanges_synced: Vec<Exchange>,
    pub jobs_submitted: usize,
    pub batches_written: usize,
    pub records_written: usize,
    pub batches_failed: usize,
}

/// Drives a sync: resume planning, job generation, pipeline, persistence
pub struct DataCollector<S: EquityStore> {
    store: Arc<S>,
    source: EquitySource,
    pipeline: PipelineConfig,
    client: Client,
    companies: Arc<ListedCompanies>,
}

impl<S: EquityStore> DataCollector<S> {
    pub fn new(store: Arc<S>, config: &Config, companies: Arc<ListedCompanies>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent("rust-bhav/0.1")
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            store,
            source: EquitySource::from_config(config),
            pipeline: PipelineConfig::from_config(config),
            client,
            companies,
        })
    }

    /// Work out the date range each requested exchange still needs
    pub async fn plan(&self, options: &SyncOptions) -> Result<Vec<SyncPlan>> {
        let mut plans = Vec::with_capacity(options.exchanges.len());
        for &exchange in &options.exchanges {
            let last = self.store.last_trading_date(exchange).await?;
            let plan = SyncPlan::resolve(exchange, options.end, options.from, last);
            info!(
                %exchange,
                last_synced = ?last,
                start = %plan.start,
                end = %plan.end,
                "resolved sync range"
            );
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Run a full sync and persist every batch the pipeline produces
    pub async fn run(&self, options: &SyncOptions) -> Result<SyncReport> {
        let plans = self.plan(options).await?;

        let mut report = SyncReport {
            exchanges_synced: plans.iter().filter(|p| !p.is_empty()).map(|p| p.exchange).collect(),
            ..SyncReport::default()
        };

        let EquityPipeline { input, mut output } = EquityPipeline::<EquityResource>::spawn(
            self.pipeline,
            self.client.clone(),
            Arc::clone(&self.companies),
        );

        let source = self.source.clone();
        let generators = spawn_generators(
            plans,
            move |plan: SyncPlan, day| source.resource(plan.exchange, day),
            input,
        );

        // each batch is its own transaction; arrival order is arbitrary
        while let Some(batch) = output.recv().await {
            match self.store.write_batch(&batch).await {
                Ok(written) => {
                    report.batches_written += 1;
                    report.records_written += written;
                    if let Some(first) = batch.first() {
                        info!(
                            exchange = %first.exchange,
                            date = %first.trading_date,
                            records = written,
                            "saved batch"
                        );
                    }
                }
                Err(e) => {
                    report.batches_failed += 1;
                    warn!(error = %format!("{:#}", e), records = batch.len(), "failed to save batch");
                }
            }
        }

        report.jobs_submitted = generators.await.context("job generators did not complete")?;

        info!(
            jobs = report.jobs_submitted,
            batches = report.batches_written,
            records = report.records_written,
            failed = report.batches_failed,
            "sync completed"
        );
        Ok(report)
    }
}
