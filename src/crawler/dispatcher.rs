//! Crawl dispatcher - worker pool orchestration
//!
//! The dispatcher owns the task queue, the result stream, the completion
//! channel, and the stop signal for one crawl. It:
//! - Starts a fixed pool of workers sharing those channels
//! - Feeds every identifier into the task queue while draining records
//! - Counts finished identifiers (not records) to detect completion
//! - Broadcasts stop and joins the pool once every identifier is finished
//!
//! Channel lengths are never used as a termination test: an empty result
//! stream says nothing about sends still in flight.

use crate::config::CrawlerConfig;
use crate::crawler::report::CrawlReport;
use crate::crawler::worker::{run_worker, WorkerChannels};
use crate::crawler::{Extractor, Fetcher};
use crate::state::{CrawlPhase, UnitOutcome};
use crate::SanError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Pool and channel sizing for one dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Number of workers
    pub pool_size: usize,

    /// Task queue capacity
    pub queue_capacity: usize,

    /// Result stream capacity
    pub result_capacity: usize,

    /// Optional overall deadline
    pub deadline: Option<Duration>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for DispatchSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            queue_capacity: config.queue_capacity,
            result_capacity: config.result_capacity,
            deadline: config.deadline_secs.map(Duration::from_secs),
        }
    }
}

impl DispatchSettings {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_result_capacity(mut self, result_capacity: usize) -> Self {
        self.result_capacity = result_capacity;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Runs crawls over a fixed-size pool of fetch workers
///
/// Each call to [`Dispatcher::crawl`] builds its own channels and pool, so
/// independent crawls may run concurrently on one dispatcher.
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    settings: DispatchSettings,
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatcher)` - Ready to crawl
    /// * `Err(SanError::InvalidPoolSize)` - `pool_size` was zero
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        mut settings: DispatchSettings,
    ) -> Result<Self, SanError> {
        if settings.pool_size == 0 {
            return Err(SanError::InvalidPoolSize(settings.pool_size));
        }

        // Zero-capacity channels do not exist; treat as the smallest bound
        settings.queue_capacity = settings.queue_capacity.max(1);
        settings.result_capacity = settings.result_capacity.max(1);

        Ok(Self {
            fetcher,
            extractor,
            settings,
        })
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Crawls every identifier and returns the deduplicated records
    ///
    /// # Phases
    ///
    /// 1. `Idle → Feeding`: start the pool, then enqueue identifiers while
    ///    draining records and completions (whichever is ready first)
    /// 2. `Feeding → Draining`: every identifier enqueued; keep draining until
    ///    the finished-unit count reaches the number of identifiers
    /// 3. `Draining → Stopping`: broadcast stop, drain until every worker
    ///    has exited, join the pool
    /// 4. `Stopping → Done`: hand back the report
    ///
    /// If a deadline is configured and expires, the dispatcher stops feeding
    /// and goes straight to `Stopping`; in-flight fetches are allowed to
    /// finish and their records are kept.
    ///
    /// Fetch failures never abort the crawl; they are collected in
    /// [`CrawlReport::failures`].
    pub async fn crawl(&self, identifiers: Vec<String>) -> Result<CrawlReport, SanError> {
        let total = identifiers.len();
        let (mut report, started) = CrawlReport::start(total);
        let mut phase = CrawlPhase::Idle;

        tracing::info!(
            "Crawling {} identifiers with {} workers",
            total,
            self.settings.pool_size
        );

        let (task_tx, task_rx) = mpsc::channel::<String>(self.settings.queue_capacity);
        let (record_tx, mut record_rx) = mpsc::channel::<String>(self.settings.result_capacity);
        let (finished_tx, mut finished_rx) =
            mpsc::channel::<UnitOutcome>(self.settings.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers = self.spawn_pool(
            Arc::new(Mutex::new(task_rx)),
            record_tx,
            finished_tx,
            shutdown_rx,
        );

        let deadline = self.settings.deadline.map(|d| Instant::now() + d);
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        phase = advance(phase, CrawlPhase::Feeding)?;
        let mut pending = identifiers.into_iter();
        let mut next = pending.next();
        if next.is_none() {
            phase = advance(phase, CrawlPhase::Draining)?;
        }

        while report.statistics.units_finished < total {
            tokio::select! {
                permit = task_tx.reserve(), if next.is_some() => match permit {
                    Ok(permit) => {
                        if let Some(identifier) = next.take() {
                            permit.send(identifier);
                        }
                        next = pending.next();
                        if next.is_none() {
                            phase = advance(phase, CrawlPhase::Draining)?;
                        }
                    }
                    Err(_) => {
                        tracing::error!("Task queue closed with identifiers still pending");
                        break;
                    }
                },
                Some(name) = record_rx.recv() => report.record(name),
                outcome = finished_rx.recv() => match outcome {
                    Some(outcome) => report.finish_unit(outcome),
                    None => {
                        tracing::error!(
                            "All workers exited with {} of {} identifiers finished",
                            report.statistics.units_finished,
                            total
                        );
                        break;
                    }
                },
                _ = &mut expired => {
                    tracing::warn!(
                        "Crawl deadline expired with {} of {} identifiers finished",
                        report.statistics.units_finished,
                        total
                    );
                    report.timed_out = true;
                    break;
                }
            }
        }

        phase = advance(phase, CrawlPhase::Stopping)?;
        drop(task_tx);
        // Fails only if every worker is already gone
        let _ = shutdown_tx.send(true);

        // Workers drop their senders on exit, so both channels close once
        // the pool is gone. Anything still in flight is kept.
        let mut records_open = true;
        let mut finished_open = true;
        while records_open || finished_open {
            tokio::select! {
                name = record_rx.recv(), if records_open => match name {
                    Some(name) => report.record(name),
                    None => records_open = false,
                },
                outcome = finished_rx.recv(), if finished_open => match outcome {
                    Some(outcome) => report.finish_unit(outcome),
                    None => finished_open = false,
                },
            }
        }

        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        phase = advance(phase, CrawlPhase::Done)?;
        report.close(started);

        let stats = &report.statistics;
        tracing::info!(
            "Crawl {}: {} identifiers finished ({} fetch failures), {} unique names in {:?}",
            phase,
            stats.units_finished,
            stats.fetch_failures,
            stats.unique_records,
            stats.elapsed
        );

        Ok(report)
    }

    fn spawn_pool(
        &self,
        tasks: Arc<Mutex<mpsc::Receiver<String>>>,
        records: mpsc::Sender<String>,
        finished: mpsc::Sender<UnitOutcome>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        (0..self.settings.pool_size)
            .map(|worker_id| {
                let channels = WorkerChannels {
                    tasks: Arc::clone(&tasks),
                    records: records.clone(),
                    finished: finished.clone(),
                    shutdown: shutdown.clone(),
                };
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.extractor),
                    channels,
                ))
            })
            .collect()
    }
}

fn advance(phase: CrawlPhase, to: CrawlPhase) -> Result<CrawlPhase, SanError> {
    let next = phase.transition(to)?;
    tracing::debug!("Crawl phase {} -> {}", phase, next);
    Ok(next)
}
