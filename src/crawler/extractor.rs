//! Name extraction from certificate detail pages
//!
//! Extraction is a pure function of the document; networking and concurrency
//! live elsewhere. Any `Fn(&Document) -> Result<Vec<String>, ExtractError>`
//! closure is an [`Extractor`], which keeps test doubles trivial.

use crate::config::ExtractorConfig;
use crate::crawler::Document;
use crate::names::normalize_name;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

/// Matches `commonName = <name>` and `DNS:<name>` in rendered certificate text
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:commonName\s*=\s*|DNS:\s*)([A-Za-z0-9*_][A-Za-z0-9*._-]*)")
        .expect("certificate name regex should compile")
});

/// Why a document yielded no records
///
/// Extraction failures are never fatal; the unit counts as zero records.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No certificate text found in document")]
    MissingCertificate,

    #[error("Failed to parse document: {message}")]
    Parse { message: String },
}

/// Produces zero or more records from one document
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<Vec<String>, ExtractError>;
}

impl<F> Extractor for F
where
    F: Fn(&Document) -> Result<Vec<String>, ExtractError> + Send + Sync,
{
    fn extract(&self, document: &Document) -> Result<Vec<String>, ExtractError> {
        self(document)
    }
}

/// Extracts hostnames from a crt.sh certificate page
///
/// # Extraction Rules
///
/// - Only the certificate text cell (`td.text`) is searched
/// - Subject common names (`commonName = ...`) and SAN entries (`DNS:...`)
///   are collected in document order
/// - **Issuer policy:** with `skip_issuer_name` set, the first match is dropped
///   unconditionally. The issuer block precedes the subject in the rendered
///   certificate, so the first common name is the issuing CA's, not ours.
/// - Names are normalized; matches that are not hostnames or wildcard
///   patterns are discarded
///
/// Duplicates are left in place; the result set deduplicates.
#[derive(Debug, Clone)]
pub struct CertPageExtractor {
    skip_issuer_name: bool,
}

impl CertPageExtractor {
    pub fn new(skip_issuer_name: bool) -> Self {
        Self { skip_issuer_name }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.skip_issuer_name)
    }
}

impl Default for CertPageExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Extractor for CertPageExtractor {
    fn extract(&self, document: &Document) -> Result<Vec<String>, ExtractError> {
        let text = certificate_text(&document.body)?;
        let skip = usize::from(self.skip_issuer_name);

        Ok(NAME_PATTERN
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1))
            .skip(skip)
            .filter_map(|m| normalize_name(m.as_str()))
            .collect())
    }
}

/// Collects the certificate text cell(s), one line per text node
fn certificate_text(html: &str) -> Result<String, ExtractError> {
    let selector = Selector::parse("td.text").map_err(|e| ExtractError::Parse {
        message: e.to_string(),
    })?;

    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();

    for cell in document.select(&selector) {
        lines.extend(cell.text().map(|t| t.replace('\u{a0}', " ")));
    }

    if lines.is_empty() {
        return Err(ExtractError::MissingCertificate);
    }

    Ok(lines.join("\n"))
}
