//! Crawler module for certificate page scraping
//!
//! This module contains the scraping strategy, including:
//! - Identifier listing from certificate search pages
//! - Concurrent fetching through a fixed worker pool
//! - Name extraction from certificate detail pages
//! - Crawl coordination, completion detection, and reporting

mod dispatcher;
mod extractor;
mod fetcher;
mod report;
mod source;
mod worker;

pub use dispatcher::{DispatchSettings, Dispatcher};
pub use extractor::{CertPageExtractor, ExtractError, Extractor};
pub use fetcher::{build_http_client, Document, FetchError, Fetcher, HttpFetcher};
pub use report::{CrawlReport, CrawlStatistics, FailureKind, UnitFailure};
pub use source::{parse_listing, CrtShSource, IdentifierSource};

use crate::config::Config;
use crate::SanError;
use std::sync::Arc;
use url::Url;

/// Lists identifiers for `seed` and crawls them
///
/// Source failures are returned before any crawl begins. Configured
/// exclusion patterns are applied to the finished result set.
pub async fn run_scrape(
    source: &dyn IdentifierSource,
    dispatcher: &Dispatcher,
    seed: &str,
    exclude: &[String],
) -> Result<CrawlReport, SanError> {
    let identifiers = source.list_identifiers(seed).await?;

    let mut report = dispatcher.crawl(identifiers).await?;

    let removed = report.records.exclude(exclude);
    if removed > 0 {
        tracing::info!("Excluded {} names matching filter patterns", removed);
        report.statistics.unique_records = report.records.len();
    }

    Ok(report)
}

/// Runs a complete scrape against the configured certificate search site
///
/// This is the main entry point for the scraping strategy. It will:
/// 1. Build the shared HTTP client
/// 2. List certificate identifiers matching the seed
/// 3. Crawl every certificate page through the worker pool
/// 4. Return the deduplicated names with per-identifier failures
///
/// # Example
///
/// ```no_run
/// use san_crawler::config::Config;
/// use san_crawler::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = crawl(&Config::default(), "acme corp").await?;
/// for name in report.records.iter() {
///     println!("{}", name);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config, seed: &str) -> Result<CrawlReport, SanError> {
    let client = build_http_client(&config.user_agent, &config.source)?;
    let base_url = Url::parse(&config.source.base_url)?;

    let source = CrtShSource::from_config(client.clone(), &config.source)?;
    let fetcher = HttpFetcher::new(client, base_url);
    let extractor = CertPageExtractor::from_config(&config.extractor);

    let dispatcher = Dispatcher::new(
        Arc::new(fetcher),
        Arc::new(extractor),
        DispatchSettings::from(&config.crawler),
    )?;

    run_scrape(&source, &dispatcher, seed, &config.filter.exclude).await
}
