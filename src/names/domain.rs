/// Second-level labels under which registrations commonly happen (`example.co.uk`)
const COMMON_SECOND_LEVEL: &[&str] = &["co", "net", "org", "com"];

/// Derives the registered (root) domain of a record
///
/// This is a heuristic, not a public-suffix lookup:
/// - a single label has no root domain
/// - one or two labels are their own root
/// - otherwise the last two labels, or the last three when the second-to-last
///   label is a common second-level label
///
/// # Examples
///
/// ```
/// use san_crawler::names::root_domain;
///
/// assert_eq!(root_domain("www.example.com"), Some("example.com".to_string()));
/// assert_eq!(root_domain("shop.example.co.uk"), Some("example.co.uk".to_string()));
/// assert_eq!(root_domain("*.api.example.org"), Some("example.org".to_string()));
/// assert_eq!(root_domain("intranet"), None);
/// ```
pub fn root_domain(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split('.').collect();

    if parts.len() <= 1 {
        return None;
    }

    if parts.len() == 2 {
        return Some(name.to_string());
    }

    let keep = if COMMON_SECOND_LEVEL.contains(&parts[parts.len() - 2]) {
        3
    } else {
        2
    };

    Some(parts[parts.len() - keep..].join("."))
}
