//! San-Crawler: subdomain discovery from certificate transparency data
//!
//! This crate finds hostnames associated with an organization by searching a
//! public certificate-transparency dataset and extracting the names embedded in
//! matching certificates. Two strategies are provided: a concurrent crawl over
//! per-certificate pages (see [`crawler`]) and a direct structured query
//! (see [`query`]).

pub mod config;
pub mod crawler;
pub mod names;
pub mod output;
pub mod query;
pub mod state;

use thiserror::Error;

/// Main error type for San-Crawler operations
#[derive(Debug, Error)]
pub enum SanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identifier source {source_name} unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Worker pool size must be at least 1, got {0}")]
    InvalidPoolSize(usize),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for San-Crawler operations
pub type Result<T> = std::result::Result<T, SanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Dispatcher};
pub use names::ResultSet;
pub use state::CrawlPhase;
