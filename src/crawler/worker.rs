//! Fetch workers
//!
//! A worker repeatedly races the stop signal against the next identifier on
//! the shared task queue. For each identifier it fetches, extracts, pushes
//! every record onto the result stream, and only then reports the finished
//! unit on the completion channel. That ordering is what lets the dispatcher
//! count identifiers instead of records. A panic inside the fetcher or
//! extractor is caught and reported as a failed unit, so every identifier a
//! worker claims produces exactly one completion.

use crate::crawler::{Extractor, Fetcher};
use crate::state::{UnitOutcome, UnitStatus};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

/// Channel ends shared by every worker in a pool
pub(crate) struct WorkerChannels {
    /// Task queue; the receiver is shared by the whole pool
    pub tasks: Arc<Mutex<mpsc::Receiver<String>>>,

    /// Result stream
    pub records: mpsc::Sender<String>,

    /// Completion channel, one message per finished identifier
    pub finished: mpsc::Sender<UnitOutcome>,

    /// Stop signal, `true` once the dispatcher wants the pool gone
    pub shutdown: watch::Receiver<bool>,
}

/// Services the task queue until stopped
pub(crate) async fn run_worker(
    worker_id: usize,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    channels: WorkerChannels,
) {
    let WorkerChannels {
        tasks,
        records,
        finished,
        mut shutdown,
    } = channels;

    tracing::trace!("Worker {} started", worker_id);

    loop {
        let next = tokio::select! {
            biased;

            _ = shutdown.wait_for(|stop| *stop) => None,
            identifier = async {
                let mut rx = tasks.lock().await;
                rx.recv().await
            } => identifier,
        };

        let identifier = match next {
            Some(identifier) => identifier,
            None => break,
        };

        let status = match AssertUnwindSafe(process_identifier(
            worker_id,
            &identifier,
            fetcher.as_ref(),
            extractor.as_ref(),
            &records,
        ))
        .catch_unwind()
        .await
        {
            Ok(status) => status,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    "Worker {} panicked on certificate {}: {}",
                    worker_id,
                    identifier,
                    message
                );
                UnitStatus::Panicked { message }
            }
        };

        if finished
            .send(UnitOutcome::new(identifier, status))
            .await
            .is_err()
        {
            break;
        }
    }

    tracing::trace!("Worker {} stopped", worker_id);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

/// Fetch, extract, and publish one identifier
///
/// Fetch failures are logged and reported as the unit's status; they never
/// end the worker.
async fn process_identifier(
    worker_id: usize,
    identifier: &str,
    fetcher: &dyn Fetcher,
    extractor: &dyn Extractor,
    records: &mpsc::Sender<String>,
) -> UnitStatus {
    let document = match fetcher.fetch(identifier).await {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Failed to fetch certificate {}: {}", identifier, e);
            return UnitStatus::FetchFailed(e);
        }
    };

    let names = match extractor.extract(&document) {
        Ok(names) => names,
        Err(e) => {
            tracing::debug!("No names extracted from certificate {}: {}", identifier, e);
            return UnitStatus::ExtractFailed {
                message: e.to_string(),
            };
        }
    };

    let mut pushed = 0;
    for name in names {
        if records.send(name).await.is_err() {
            break;
        }
        pushed += 1;
    }

    tracing::debug!(
        "Worker {} finished certificate {} ({} names)",
        worker_id,
        identifier,
        pushed
    );

    UnitStatus::Extracted { records: pushed }
}
