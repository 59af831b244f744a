use serde::Deserialize;

/// Main configuration structure for San-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Worker pool and channel sizing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: usize,

    /// Capacity of the identifier queue shared by all workers
    #[serde(rename = "queue-capacity", default = "default_capacity")]
    pub queue_capacity: usize,

    /// Capacity of the record stream drained by the dispatcher
    #[serde(rename = "result-capacity", default = "default_capacity")]
    pub result_capacity: usize,

    /// Overall crawl deadline in seconds (no deadline when absent)
    #[serde(rename = "deadline-secs", default)]
    pub deadline_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            queue_capacity: default_capacity(),
            result_capacity: default_capacity(),
            deadline_secs: None,
        }
    }
}

/// Certificate transparency web front end
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the search front end
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Listing query parameters searched for the seed (e.g. "O", "OU")
    #[serde(rename = "search-fields", default = "default_search_fields")]
    pub search_fields: Vec<String>,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(
        rename = "connect-timeout-secs",
        default = "default_connect_timeout_secs"
    )]
    pub connect_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_fields: default_search_fields(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Certificate page extraction policy
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Drop the first matched name on every page (the issuer's common name)
    #[serde(rename = "skip-issuer-name", default = "default_true")]
    pub skip_issuer_name: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            skip_issuer_name: true,
        }
    }
}

/// Direct query strategy settings
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// PostgreSQL connection string of the certificate database
    #[serde(rename = "database-url", default = "default_database_url")]
    pub database_url: String,

    /// Look up organizations linked to each discovered root domain
    #[serde(rename = "discover-orgs", default = "default_true")]
    pub discover_orgs: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            discover_orgs: true,
        }
    }
}

/// Result filtering
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Domain patterns (e.g. "*.cloudflaressl.com") removed from the results
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_pool_size() -> usize {
    50
}

fn default_capacity() -> usize {
    1000
}

fn default_base_url() -> String {
    "https://crt.sh/".to_string()
}

fn default_search_fields() -> Vec<String> {
    vec!["O".to_string(), "OU".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_crawler_name() -> String {
    "san-crawler".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_database_url() -> String {
    "postgres://guest@crt.sh:5432/certwatch?sslmode=disable".to_string()
}

fn default_true() -> bool {
    true
}
