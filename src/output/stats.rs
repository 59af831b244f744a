//! Crawl statistics display

use crate::crawler::CrawlStatistics;
use std::fmt::Write;

/// Formats statistics as a human-readable block
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Identifiers: {}", stats.identifiers_total);
    let _ = writeln!(out, "  Finished: {}", stats.units_finished);
    let _ = writeln!(out, "  Fetched: {}", stats.fetched());
    let _ = writeln!(out, "  Fetch failures: {}", stats.fetch_failures);
    let _ = writeln!(out, "  Extract failures: {}", stats.extract_failures);
    if stats.panics > 0 {
        let _ = writeln!(out, "  Panics: {}", stats.panics);
    }
    if stats.abandoned > 0 {
        let _ = writeln!(out, "  Abandoned: {}", stats.abandoned);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Names:");
    let _ = writeln!(out, "  Received: {}", stats.records_received);
    let _ = writeln!(out, "  Unique: {}", stats.unique_records);
    let _ = writeln!(out);

    let success_rate = if stats.identifiers_total > 0 {
        (stats.fetched() as f64 / stats.identifiers_total as f64) * 100.0
    } else {
        0.0
    };

    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} certificates fetched)",
        success_rate,
        stats.fetched(),
        stats.identifiers_total
    );
    let _ = write!(
        out,
        "Elapsed: {:.2}s ({:.2} certificates/sec)",
        stats.elapsed.as_secs_f64(),
        stats.rate()
    );

    out
}

/// Prints statistics to stderr, keeping stdout for names
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("{}", format_statistics(stats));
}
