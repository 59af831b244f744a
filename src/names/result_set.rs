use crate::names::{matches_any, root_domain};
use serde::Serialize;
use std::collections::BTreeSet;

/// Deduplicated accumulation of records for one crawl or query
///
/// Membership is idempotent and insertion order is irrelevant. The set is kept
/// ordered so that rendered output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    names: BTreeSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record; returns false if it was already present
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Removes records matching any pattern and returns how many were removed
    ///
    /// Patterns are compared case-insensitively; records are always lowercase.
    pub fn exclude<S: AsRef<str>>(&mut self, patterns: &[S]) -> usize {
        if patterns.is_empty() {
            return 0;
        }

        let patterns: Vec<String> = patterns
            .iter()
            .map(|pattern| pattern.as_ref().trim().to_lowercase())
            .collect();

        let before = self.names.len();
        self.names.retain(|name| !matches_any(&patterns, name));
        before - self.names.len()
    }

    /// Registered domains covering the records
    pub fn root_domains(&self) -> BTreeSet<String> {
        self.names.iter().filter_map(|name| root_domain(name)).collect()
    }
}

impl FromIterator<String> for ResultSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl Extend<String> for ResultSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.names.extend(iter);
    }
}

impl IntoIterator for ResultSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}
