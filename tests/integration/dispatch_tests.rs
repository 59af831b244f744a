//! Dispatcher properties exercised with in-memory fetchers

use async_trait::async_trait;
use san_crawler::crawler::{
    DispatchSettings, Dispatcher, Document, ExtractError, Extractor, FailureKind, FetchError,
    Fetcher,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers every identifier with `<id>.example.com,shared.example.com`;
/// identifiers listed in `failing` get HTTP 503
struct SyntheticFetcher {
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl SyntheticFetcher {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Fetcher for SyntheticFetcher {
    async fn fetch(&self, identifier: &str) -> Result<Document, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(identifier) {
            return Err(FetchError::Status { status: 503 });
        }
        if identifier == "panic" {
            panic!("fetcher panicked on {}", identifier);
        }
        Ok(Document::new(
            identifier,
            format!("mem://{}", identifier),
            format!("{}.example.com,shared.example.com", identifier),
        ))
    }
}

fn comma_extractor() -> Arc<dyn Extractor> {
    Arc::new(|doc: &Document| -> Result<Vec<String>, ExtractError> {
        Ok(doc.body.split(',').map(String::from).collect())
    })
}

fn numbered(count: usize) -> Vec<String> {
    (1..=count).map(|i| i.to_string()).collect()
}

#[tokio::test]
async fn test_partial_failure_keeps_successful_records() {
    let fetcher = Arc::new(SyntheticFetcher::new(&["2", "5", "9"]));
    let dispatcher = Dispatcher::new(
        fetcher.clone(),
        comma_extractor(),
        DispatchSettings::default().with_pool_size(4),
    )
    .unwrap();

    let report = dispatcher.crawl(numbered(10)).await.unwrap();

    // 7 per-identifier names plus the shared one
    assert_eq!(report.records.len(), 8);
    assert!(report.records.contains("shared.example.com"));
    assert!(!report.records.contains("2.example.com"));
    assert_eq!(report.statistics.units_finished, 10);
    assert_eq!(report.statistics.fetch_failures, 3);
    assert_eq!(report.statistics.records_received, 14);

    let mut failed: Vec<&str> = report
        .fetch_failures()
        .map(|f| f.identifier.as_str())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["2", "5", "9"]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_result_independent_of_pool_size() {
    let identifiers = numbered(40);

    let small = Dispatcher::new(
        Arc::new(SyntheticFetcher::new(&["7"])),
        comma_extractor(),
        DispatchSettings::default().with_pool_size(1),
    )
    .unwrap()
    .crawl(identifiers.clone())
    .await
    .unwrap();

    let large = Dispatcher::new(
        Arc::new(SyntheticFetcher::new(&["7"])),
        comma_extractor(),
        DispatchSettings::default().with_pool_size(50),
    )
    .unwrap()
    .crawl(identifiers)
    .await
    .unwrap();

    assert_eq!(small.records, large.records);
    assert_eq!(small.statistics.fetch_failures, 1);
    assert_eq!(large.statistics.fetch_failures, 1);
}

#[tokio::test]
async fn test_duplicate_identifiers_are_processed_per_occurrence() {
    let fetcher = Arc::new(SyntheticFetcher::new(&[]));
    let dispatcher = Dispatcher::new(
        fetcher.clone(),
        comma_extractor(),
        DispatchSettings::default().with_pool_size(3),
    )
    .unwrap();

    let report = dispatcher
        .crawl(vec!["1".into(), "1".into(), "2".into()])
        .await
        .unwrap();

    assert_eq!(report.statistics.units_finished, 3);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    let names: Vec<&str> = report.records.iter().collect();
    assert_eq!(
        names,
        vec!["1.example.com", "2.example.com", "shared.example.com"]
    );
}

#[tokio::test]
async fn test_deadline_keeps_partial_results() {
    let fetcher = Arc::new(SyntheticFetcher::new(&[]).with_delay(Duration::from_millis(200)));
    let dispatcher = Dispatcher::new(
        fetcher,
        comma_extractor(),
        DispatchSettings::default()
            .with_pool_size(2)
            .with_deadline(Duration::from_millis(300)),
    )
    .unwrap();

    let report = dispatcher.crawl(numbered(20)).await.unwrap();

    assert!(report.timed_out);
    assert!(!report.is_complete());
    assert!(report.statistics.abandoned > 0);
    assert_eq!(
        report.statistics.units_finished + report.statistics.abandoned,
        20
    );
    // The first pair of fetches finished before the deadline
    assert!(report.records.contains("shared.example.com"));
}

#[tokio::test]
async fn test_many_records_through_unit_capacity_channels() {
    let dispatcher = Dispatcher::new(
        Arc::new(SyntheticFetcher::new(&[])),
        Arc::new(|doc: &Document| -> Result<Vec<String>, ExtractError> {
            Ok((0..100)
                .map(|i| format!("h{}.{}.example.com", i, doc.identifier))
                .collect())
        }),
        DispatchSettings::default()
            .with_pool_size(8)
            .with_queue_capacity(1)
            .with_result_capacity(1),
    )
    .unwrap();

    let report = dispatcher.crawl(numbered(30)).await.unwrap();

    assert_eq!(report.records.len(), 3000);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_panicking_fetcher_does_not_stall_crawl() {
    let dispatcher = Dispatcher::new(
        Arc::new(SyntheticFetcher::new(&[])),
        comma_extractor(),
        DispatchSettings::default().with_pool_size(4),
    )
    .unwrap();

    let report = tokio::time::timeout(
        Duration::from_secs(3),
        dispatcher.crawl(vec!["a".into(), "panic".into(), "b".into()]),
    )
    .await
    .expect("crawl should finish despite a panicking fetcher")
    .unwrap();

    assert_eq!(report.statistics.units_finished, 3);
    assert_eq!(report.statistics.panics, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].identifier, "panic");
    assert_eq!(report.failures[0].kind, FailureKind::Panic);
    let names: Vec<&str> = report.records.iter().collect();
    assert_eq!(
        names,
        vec!["a.example.com", "b.example.com", "shared.example.com"]
    );
}
