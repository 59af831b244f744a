//! Output module for rendering discovered names
//!
//! This module handles:
//! - Writing the result set as plain lines (one name per line)
//! - Writing a JSON summary with root domains and per-identifier failures
//! - Printing crawl statistics

pub mod stats;

pub use stats::{format_statistics, print_statistics};

use crate::crawler::{CrawlReport, CrawlStatistics, UnitFailure};
use crate::names::ResultSet;
use crate::SanError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// How results are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One name per line
    #[default]
    Plain,
    /// A single JSON document
    Json,
}

/// Everything a discovery run hands to the output layer
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverySummary {
    pub seed: String,
    pub strategy: String,
    pub names: ResultSet,
    pub domains: BTreeSet<String>,
    /// Organizations linked to the discovered domains (query strategy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_orgs: Option<BTreeSet<String>>,
    pub failures: Vec<UnitFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<CrawlStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl DiscoverySummary {
    /// Summary of a scrape crawl
    pub fn from_report(seed: &str, report: CrawlReport) -> Self {
        let domains = report.records.root_domains();
        Self {
            seed: seed.to_string(),
            strategy: "scrape".to_string(),
            names: report.records,
            domains,
            possible_orgs: None,
            failures: report.failures,
            statistics: Some(report.statistics),
            config_hash: None,
        }
    }

    /// Summary of a direct query
    pub fn from_names(seed: &str, names: ResultSet) -> Self {
        let domains = names.root_domains();
        Self {
            seed: seed.to_string(),
            strategy: "query".to_string(),
            names,
            domains,
            possible_orgs: None,
            failures: Vec::new(),
            statistics: None,
            config_hash: None,
        }
    }

    pub fn with_possible_orgs(mut self, orgs: BTreeSet<String>) -> Self {
        self.possible_orgs = Some(orgs);
        self
    }

    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }
}

/// Writes every name on its own line
pub fn write_plain<W: Write>(names: &ResultSet, writer: &mut W) -> io::Result<()> {
    for name in names.iter() {
        writeln!(writer, "{}", name)?;
    }
    writer.flush()
}

/// Writes the summary as pretty-printed JSON followed by a newline
pub fn write_json<W: Write>(summary: &DiscoverySummary, writer: &mut W) -> Result<(), SanError> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Renders the summary to a writer in the requested format
pub fn render<W: Write>(
    summary: &DiscoverySummary,
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), SanError> {
    match format {
        OutputFormat::Plain => write_plain(&summary.names, writer)?,
        OutputFormat::Json => write_json(summary, writer)?,
    }
    Ok(())
}

/// Renders the summary to `path`, or to stdout when no path is given
pub fn write_output(
    summary: &DiscoverySummary,
    format: OutputFormat,
    path: Option<&Path>,
) -> Result<(), SanError> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            render(summary, format, &mut writer)?;
            tracing::info!("Wrote {} names to {}", summary.names.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            render(summary, format, &mut writer)?;
        }
    }
    Ok(())
}
