//! Name handling for extracted records
//!
//! This module provides record normalization, registered-domain derivation,
//! wildcard exclusion matching, and the deduplicating [`ResultSet`].

mod domain;
mod matcher;
mod normalize;
mod result_set;

// Re-export main functions
pub use domain::root_domain;
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::{is_valid_name, normalize_name};
pub use result_set::ResultSet;
