//! Crawl results and statistics

use crate::names::ResultSet;
use crate::state::{UnitOutcome, UnitStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Which stage of an identifier's processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    Extract,
    Panic,
}

/// A per-identifier failure captured during the crawl
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub identifier: String,
    pub kind: FailureKind,
    pub error: String,
}

/// Counters for one crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStatistics {
    /// Identifiers handed to the dispatcher
    pub identifiers_total: usize,

    /// Identifiers whose processing fully completed (including failures)
    pub units_finished: usize,

    /// Identifiers whose document was retrieved
    pub units_fetched: usize,

    pub fetch_failures: usize,

    pub extract_failures: usize,

    /// Identifiers abandoned because the fetcher or extractor panicked
    pub panics: usize,

    /// Records received from workers, before deduplication
    pub records_received: usize,

    /// Records in the final result set
    pub unique_records: usize,

    /// Identifiers never finished because the crawl stopped early
    pub abandoned: usize,

    pub started_at: Option<DateTime<Utc>>,

    pub finished_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Units that were fetched successfully
    pub fn fetched(&self) -> usize {
        self.units_fetched
    }

    /// Units per second over the whole crawl
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.units_finished as f64 / secs
        } else {
            0.0
        }
    }
}

/// Everything one crawl produced
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Deduplicated records extracted from every successfully fetched document
    pub records: ResultSet,

    /// Per-identifier failures, in the order they were reported
    pub failures: Vec<UnitFailure>,

    pub statistics: CrawlStatistics,

    /// True if the crawl deadline expired before every unit finished
    pub timed_out: bool,
}

impl CrawlReport {
    pub(crate) fn start(identifiers_total: usize) -> (Self, Instant) {
        let report = Self {
            statistics: CrawlStatistics {
                identifiers_total,
                started_at: Some(Utc::now()),
                ..Default::default()
            },
            ..Default::default()
        };
        (report, Instant::now())
    }

    pub(crate) fn record(&mut self, name: String) {
        self.statistics.records_received += 1;
        self.records.insert(name);
    }

    pub(crate) fn finish_unit(&mut self, outcome: UnitOutcome) {
        self.statistics.units_finished += 1;
        if outcome.status.is_fetched() {
            self.statistics.units_fetched += 1;
        }

        match outcome.status {
            UnitStatus::Extracted { .. } => {}
            UnitStatus::ExtractFailed { message } => {
                self.statistics.extract_failures += 1;
                self.failures.push(UnitFailure {
                    identifier: outcome.identifier,
                    kind: FailureKind::Extract,
                    error: message,
                });
            }
            UnitStatus::FetchFailed(e) => {
                self.statistics.fetch_failures += 1;
                self.failures.push(UnitFailure {
                    identifier: outcome.identifier,
                    kind: FailureKind::Fetch,
                    error: e.to_string(),
                });
            }
            UnitStatus::Panicked { message } => {
                self.statistics.panics += 1;
                self.failures.push(UnitFailure {
                    identifier: outcome.identifier,
                    kind: FailureKind::Panic,
                    error: message,
                });
            }
        }
    }

    pub(crate) fn close(&mut self, started: Instant) {
        let stats = &mut self.statistics;
        stats.unique_records = self.records.len();
        stats.abandoned = stats.identifiers_total.saturating_sub(stats.units_finished);
        stats.finished_at = Some(Utc::now());
        stats.elapsed = started.elapsed();
    }

    /// True if no identifier failed or was abandoned
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.timed_out && self.statistics.abandoned == 0
    }

    /// Failures of the fetch stage only
    pub fn fetch_failures(&self) -> impl Iterator<Item = &UnitFailure> {
        self.failures
            .iter()
            .filter(|failure| failure.kind == FailureKind::Fetch)
    }
}
