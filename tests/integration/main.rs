//! Integration test harness

mod crawl_tests;
mod dispatch_tests;
