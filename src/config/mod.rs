//! Configuration module for San-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use san_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("san-crawler.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.pool_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExtractorConfig, FilterConfig, QueryConfig, SourceConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
