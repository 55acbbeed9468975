//! Background pipeline that downloads exchange reports, parses them and
//! publishes record batches.
//!
//! Two worker pools are connected by bounded channels: downloaders pull
//! [`Resource`]s from a shared input and hand [`Parseable`] payloads on, parsers
//! turn those into batches of [`EquityRecord`](crate::models::EquityRecord)s.
//! Each pool's per-worker outputs are combined with [`merge::fan_in`]. A failed
//! download or parse is logged and dropped; it never stops the pipeline.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::models::{Config, EquityBatch, Exchange};

pub mod archive;
pub mod bse;
pub mod error;
pub mod listed_companies;
pub mod merge;
pub mod nse;
pub mod report;
pub mod resource;

pub use error::{error_chain, ArchiveError, FetchError, ParseError, ReferenceDataError};
pub use listed_companies::{ListedCompanies, ListedCompany};
pub use resource::{EquityPayload, EquityResource, EquitySource};

/// Capacity of every stage hand-off; a sender waits until its item is taken
pub const HANDOFF_CAPACITY: usize = 1;

/// A network resource that can be fetched into a [`Parseable`] payload
#[async_trait]
pub trait Resource: fmt::Display + Send + Sync + 'static {
    type Payload: Parseable;

    fn exchange(&self) -> Exchange;

    fn date(&self) -> NaiveDate;

    async fn fetch(&self, client: &Client) -> Result<Self::Payload, FetchError>;
}

/// An in-memory report that can be decoded into records
pub trait Parseable: Send + 'static {
    fn exchange(&self) -> Exchange;

    fn date(&self) -> NaiveDate;

    fn parse(self, companies: &ListedCompanies) -> Result<EquityBatch, ParseError>;
}

/// Worker pool sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub download_workers: usize,
    pub parse_workers: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_workers: config.download_workers.max(1),
            parse_workers: config.parse_workers.max(1),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            download_workers: parallelism * 2,
            parse_workers: parallelism,
        }
    }
}

/// Input and output ends of a running pipeline
pub struct EquityPipeline<R: Resource> {
    pub input: mpsc::Sender<R>,
    pub output: mpsc::Receiver<EquityBatch>,
}

impl<R: Resource> EquityPipeline<R> {
    /// Start the worker pools on the current tokio runtime.
    ///
    /// The output closes once `input` (and every clone of it) is dropped and all
    /// submitted resources have been processed.
    pub fn spawn(config: PipelineConfig, client: Client, companies: Arc<ListedCompanies>) -> Self {
        let (input, input_rx) = mpsc::channel::<R>(HANDOFF_CAPACITY);
        let input_rx = Arc::new(Mutex::new(input_rx));

        let downloaders: Vec<_> = (0..config.download_workers.max(1))
            .map(|id| downloader(id, Arc::clone(&input_rx), client.clone()))
            .collect();
        let downloaded = Arc::new(Mutex::new(merge::fan_in("download", downloaders)));

        let parsers: Vec<_> = (0..config.parse_workers.max(1))
            .map(|id| parser::<R::Payload>(id, Arc::clone(&downloaded), Arc::clone(&companies)))
            .collect();

        info!(
            download_workers = config.download_workers,
            parse_workers = config.parse_workers,
            "started equity pipeline"
        );

        Self {
            input,
            output: merge::fan_in("parse", parsers),
        }
    }
}

/// Take the next item from a receiver shared by several workers
async fn next_shared<T>(shared: &Mutex<mpsc::Receiver<T>>) -> Option<T> {
    shared.lock().await.recv().await
}

fn downloader<R: Resource>(
    id: usize,
    input: Arc<Mutex<mpsc::Receiver<R>>>,
    client: Client,
) -> mpsc::Receiver<R::Payload> {
    let (out, out_rx) = mpsc::channel(HANDOFF_CAPACITY);

    tokio::spawn(async move {
        while let Some(resource) = next_shared(&input).await {
            let (exchange, date) = (resource.exchange(), resource.date());
            info!(worker = id, %exchange, %date, resource = %resource, "downloading resource");

            match resource.fetch(&client).await {
                Ok(payload) => {
                    if out.send(payload).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        worker = id,
                        %exchange,
                        %date,
                        resource = %resource,
                        error = %error_chain(&e),
                        "failed to download resource"
                    );
                }
            }
        }
        debug!(worker = id, "downloader finished");
    });

    out_rx
}

fn parser<P: Parseable>(
    id: usize,
    input: Arc<Mutex<mpsc::Receiver<P>>>,
    companies: Arc<ListedCompanies>,
) -> mpsc::Receiver<EquityBatch> {
    let (out, out_rx) = mpsc::channel(HANDOFF_CAPACITY);

    tokio::spawn(async move {
        while let Some(payload) = next_shared(&input).await {
            let (exchange, date) = (payload.exchange(), payload.date());
            let companies = Arc::clone(&companies);

            // decoding is CPU bound; keep it off the async workers
            match tokio::task::spawn_blocking(move || payload.parse(&companies)).await {
                Ok(Ok(batch)) => {
                    debug!(worker = id, %exchange, %date, records = batch.len(), "parsed report");
                    if out.send(batch).await.is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    warn!(worker = id, %exchange, %date, error = %error_chain(&e), "failed to parse result");
                }
                Err(e) => {
                    error!(worker = id, %exchange, %date, error = %e, "parse task did not complete");
                }
            }
        }
        debug!(worker = id, "parser finished");
    });

    out_rx
}
