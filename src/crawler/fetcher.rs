//! Certificate page fetcher
//!
//! This module handles all certificate page requests, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - Turning an identifier into its detail-page URL
//! - Classifying failures into per-item [`FetchError`]s

use crate::config::{SourceConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Raw content retrieved for one identifier
///
/// Owned by the worker that fetched it and discarded after extraction.
#[derive(Debug, Clone)]
pub struct Document {
    /// The identifier this document was fetched for
    pub identifier: String,

    /// Final URL the content was served from
    pub url: String,

    /// Page body
    pub body: String,
}

impl Document {
    pub fn new(
        identifier: impl Into<String>,
        url: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            url: url.into(),
            body: body.into(),
        }
    }
}

/// Why a single fetch failed
///
/// Fetch failures are per-item: the identifier is skipped and still counted
/// as a finished unit.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("Request timeout")]
    Timeout,

    #[error("Connection refused")]
    Connect,

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Failed to read body: {message}")]
    Body { message: String },

    #[error("Invalid identifier: {identifier}")]
    InvalidIdentifier { identifier: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Network {
                message: e.to_string(),
            }
        }
    }
}

/// Retrieves the document behind one identifier
///
/// Implementations must be safe to call concurrently from every worker.
/// Timeout policy belongs to the implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<Document, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use san_crawler::config::{SourceConfig, UserAgentConfig};
/// use san_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &SourceConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    source: &SourceConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(source.timeout_secs))
        .connect_timeout(Duration::from_secs(source.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches certificate detail pages (`<base>?id=<identifier>`) over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Builds the detail page URL for an identifier
    pub fn page_url(&self, identifier: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().clear().append_pair("id", identifier);
        url
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identifier: &str) -> Result<Document, FetchError> {
        if identifier.trim().is_empty() {
            return Err(FetchError::InvalidIdentifier {
                identifier: identifier.to_string(),
            });
        }

        let url = self.page_url(identifier);
        tracing::trace!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::debug!("Rate limited while fetching certificate {}", identifier);
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| FetchError::Body {
            message: e.to_string(),
        })?;

        Ok(Document::new(identifier, final_url, body))
    }
}
