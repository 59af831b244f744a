//! Identifier sources
//!
//! An identifier source turns a seed term into the finite list of
//! certificate identifiers to crawl. Failure here is fatal and is reported
//! before any crawl begins.

use crate::config::SourceConfig;
use crate::SanError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Produces the identifiers to crawl for a seed term
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    async fn list_identifiers(&self, seed: &str) -> Result<Vec<String>, SanError>;
}

/// Scrapes crt.sh search listings for certificate identifiers
///
/// One listing is requested per configured search field (e.g.
/// `?O=<seed>` and `?OU=<seed>`), and every anchor whose `href` carries an
/// `id` query parameter contributes an identifier.
#[derive(Debug, Clone)]
pub struct CrtShSource {
    client: Client,
    base_url: Url,
    search_fields: Vec<String>,
}

impl CrtShSource {
    pub fn new(client: Client, base_url: Url, search_fields: Vec<String>) -> Self {
        Self {
            client,
            base_url,
            search_fields,
        }
    }

    pub fn from_config(client: Client, config: &SourceConfig) -> Result<Self, SanError> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self::new(client, base_url, config.search_fields.clone()))
    }

    /// Builds the listing URL for one search field
    pub fn listing_url(&self, field: &str, seed: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().clear().append_pair(field, seed);
        url
    }

    async fn fetch_listing(&self, url: Url) -> Result<String, SanError> {
        let unavailable = |message: String| SanError::SourceUnavailable {
            source_name: self.base_url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| unavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("{} returned HTTP {}", url, status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| unavailable(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl IdentifierSource for CrtShSource {
    async fn list_identifiers(&self, seed: &str) -> Result<Vec<String>, SanError> {
        let mut seen = HashSet::new();
        let mut identifiers = Vec::new();

        for field in &self.search_fields {
            let url = self.listing_url(field, seed);
            tracing::info!("Listing certificates for {}={}", field, seed);

            let body = self.fetch_listing(url.clone()).await?;
            let found = parse_listing(&body, &url);
            tracing::debug!("{} identifiers on listing {}", found.len(), url);

            for id in found {
                if seen.insert(id.clone()) {
                    identifiers.push(id);
                }
            }
        }

        tracing::info!("Found {} unique certificate identifiers", identifiers.len());
        Ok(identifiers)
    }
}

/// Extracts certificate identifiers from a listing page, in page order
///
/// Duplicates are kept; callers deduplicate across listings.
pub fn parse_listing(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .filter_map(|link| {
            link.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.trim().to_string())
        })
        .filter(|id| !id.is_empty())
        .collect()
}
