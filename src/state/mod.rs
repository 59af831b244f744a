//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the dispatcher's lifecycle (idle, feeding, draining, stopping, done)
//! - `UnitStatus`: how processing of a single identifier ended

mod crawl_phase;
mod unit_status;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use unit_status::{UnitOutcome, UnitStatus};
