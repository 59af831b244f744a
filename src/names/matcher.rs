/// Checks if a record matches a domain pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///    - "*.example.com" and "*.dev.example.com" (wildcard records below it)
///
/// Both arguments are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use san_crawler::names::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "other.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(matches_wildcard("*.example.com", "*.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        let host = candidate.strip_prefix("*.").unwrap_or(candidate);
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns true if the record matches any of the patterns
pub fn matches_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_wildcard(pattern.as_ref(), candidate))
}
