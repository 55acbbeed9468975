//! Feeds one resource per trading day into the pipeline input.

use chrono::NaiveDate;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::resume::SyncPlan;
use crate::utils::MarketCalendar;

/// Submit a job for every trading day of `plan`, in increasing date order.
///
/// Returns the number of jobs submitted. Stops early if the pipeline input
/// has been closed.
pub async fn enqueue<R, F>(plan: SyncPlan, factory: F, input: mpsc::Sender<R>) -> usize
where
    F: Fn(NaiveDate) -> R,
{
    let exchange = plan.exchange;
    let mut submitted = 0;

    for day in MarketCalendar::days(plan.start, plan.end) {
        if !MarketCalendar::is_trading_day(day) {
            info!(%exchange, "skipping job for {}", day.format("%a %d %b, %Y"));
            continue;
        }

        debug!(%exchange, "enqueuing job for {}", day.format("%a %d %b, %Y"));
        if input.send(factory(day)).await.is_err() {
            warn!(%exchange, %day, "pipeline input closed, stopping generator");
            break;
        }
        submitted += 1;
    }

    submitted
}

/// Run one generator per non-empty plan concurrently.
///
/// The pipeline input is closed once every generator has finished; callers must
/// not keep their own clone of `input` alive. The handle resolves to the total
/// number of jobs submitted.
pub fn spawn_generators<R, F>(plans: Vec<SyncPlan>, factory: F, input: mpsc::Sender<R>) -> JoinHandle<usize>
where
    R: Send + 'static,
    F: Fn(SyncPlan, NaiveDate) -> R + Clone + Send + Sync + 'static,
{
    let mut handles = Vec::new();

    for plan in plans {
        if plan.is_empty() {
            info!(exchange = %plan.exchange, start = %plan.start, end = %plan.end, "nothing to sync");
            continue;
        }

        info!(exchange = %plan.exchange, start = %plan.start, end = %plan.end, "starting job generator");
        let input = input.clone();
        let factory = factory.clone();
        handles.push(tokio::spawn(async move {
            enqueue(plan, move |day| factory(plan, day), input).await
        }));
    }

    // each generator holds its own sender; the last to finish closes the input
    drop(input);

    tokio::spawn(async move {
        join_all(handles)
            .await
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(submitted) => Some(submitted),
                Err(e) => {
                    warn!(error = %e, "job generator did not complete");
                    None
                }
            })
            .sum()
    })
}
