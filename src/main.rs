//! San-Crawler main entry point
//!
//! This is the command-line interface for the San-Crawler subdomain finder.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use san_crawler::config::{self, Config};
use san_crawler::crawler::crawl;
use san_crawler::output::{print_statistics, write_output, DiscoverySummary, OutputFormat};
use san_crawler::query::DirectQuery;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// San-Crawler: find subdomains in certificate transparency data
///
/// San-Crawler searches public certificate-transparency records for
/// certificates issued to an organization and prints every hostname
/// embedded in them, one per line.
#[derive(Parser, Debug)]
#[command(name = "san-crawler")]
#[command(version)]
#[command(about = "Find subdomains in certificate transparency data", long_about = None)]
struct Cli {
    /// Organization name to search for
    #[arg(value_name = "SEED")]
    seed: String,

    /// How names are gathered
    #[arg(long, value_enum, default_value_t = Strategy::Scrape)]
    strategy: Strategy,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of concurrent fetch workers
    #[arg(short, long)]
    pool_size: Option<usize>,

    /// Stop the crawl after this many seconds, keeping what was found
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Certificate database connection string (query strategy)
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    /// Drop names matching this pattern (repeatable, e.g. "*.cdn.example.com")
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Print a JSON document instead of one name per line
    #[arg(long)]
    json: bool,

    /// Write results to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print crawl statistics to stderr when finished
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Crawl per-certificate pages with a worker pool
    Scrape,
    /// Query the certificate database directly
    Query,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let seed = cli.seed.trim().to_string();
    if seed.is_empty() {
        tracing::info!("Empty seed, nothing to search for");
        return Ok(());
    }

    let (config, config_hash) = load_configuration(&cli)?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };

    let summary = match cli.strategy {
        Strategy::Scrape => handle_scrape(&config, &seed).await?,
        Strategy::Query => handle_query(&config, &seed).await?,
    }
    .with_config_hash(config_hash);

    write_output(&summary, format, cli.output.as_deref()).context("Failed to write results")?;

    if cli.stats {
        match &summary.statistics {
            Some(stats) => print_statistics(stats),
            None => eprintln!("Found {} names", summary.names.len()),
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only results.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("san_crawler=info,warn"),
            1 => EnvFilter::new("san_crawler=debug,info"),
            2 => EnvFilter::new("san_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any), applies command-line overrides, and validates
fn load_configuration(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = config::load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(pool_size) = cli.pool_size {
        config.crawler.pool_size = pool_size;
    }
    if let Some(deadline) = cli.deadline_secs {
        config.crawler.deadline_secs = Some(deadline);
    }
    if let Some(url) = &cli.database_url {
        config.query.database_url = url.clone();
    }
    config.filter.exclude.extend(cli.exclude.iter().cloned());

    config::validate(&config).context("Invalid configuration")?;

    Ok((config, hash))
}

/// Handles the scraping strategy
async fn handle_scrape(config: &Config, seed: &str) -> anyhow::Result<DiscoverySummary> {
    tracing::info!(
        "Scraping certificates for \"{}\" with {} workers",
        seed,
        config.crawler.pool_size
    );

    let report = crawl(config, seed).await.context("Crawl failed")?;

    if report.timed_out {
        tracing::warn!(
            "Crawl deadline reached, {} certificates abandoned",
            report.statistics.abandoned
        );
    }
    if !report.failures.is_empty() {
        tracing::warn!(
            "{} certificates could not be processed",
            report.failures.len()
        );
    }
    tracing::info!(
        "Crawl completed: {} names from {} certificates",
        report.records.len(),
        report.statistics.identifiers_total
    );

    Ok(DiscoverySummary::from_report(seed, report))
}

/// Handles the direct-query strategy
async fn handle_query(config: &Config, seed: &str) -> anyhow::Result<DiscoverySummary> {
    tracing::info!("Querying certificate database for \"{}\"", seed);
    let started = Instant::now();

    let query = DirectQuery::connect(&config.query.database_url)
        .await
        .context("Could not connect to certificate database")?;
    let result = run_query(&query, config, seed).await;
    query.close().await;
    let summary = result?;

    tracing::info!(
        "Query completed: {} names across {} domains in {:.2}s",
        summary.names.len(),
        summary.domains.len(),
        started.elapsed().as_secs_f64()
    );

    Ok(summary)
}

async fn run_query(
    query: &DirectQuery,
    config: &Config,
    seed: &str,
) -> anyhow::Result<DiscoverySummary> {
    let mut names = query.run(seed).await.context("Certificate query failed")?;
    let removed = names.exclude(&config.filter.exclude);
    if removed > 0 {
        tracing::info!("Excluded {} names matching filter patterns", removed);
    }

    let summary = DiscoverySummary::from_names(seed, names);
    if !config.query.discover_orgs {
        return Ok(summary);
    }

    let orgs = query
        .possible_orgs(seed, &summary.domains)
        .await
        .context("Organization lookup failed")?;
    tracing::info!("Found {} possible organizations", orgs.len());

    Ok(summary.with_possible_orgs(orgs))
}
