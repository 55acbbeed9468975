use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::HANDOFF_CAPACITY;

/// Merge several producer streams into one.
///
/// Items are forwarded as they arrive, with no ordering across producers. The
/// merged stream closes once every producer has closed its own stream and all
/// of its items have been forwarded.
pub fn fan_in<T>(stage: &'static str, producers: Vec<mpsc::Receiver<T>>) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (merged_tx, merged_rx) = mpsc::channel(HANDOFF_CAPACITY);
    // live producer count, for the log only; the stream closes when the last
    // forwarder drops its sender
    let remaining = Arc::new(AtomicUsize::new(producers.len()));

    for mut producer in producers {
        let merged_tx = merged_tx.clone();
        let remaining = Arc::clone(&remaining);

        tokio::spawn(async move {
            while let Some(item) = producer.recv().await {
                if merged_tx.send(item).await.is_err() {
                    // consumer went away, nothing left to forward to
                    break;
                }
            }

            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                debug!(stage, "all producers finished, closing merged stream");
            }
        });
    }

    // the forwarders now own the only senders; the last one out closes the stream
    drop(merged_tx);
    merged_rx
}
