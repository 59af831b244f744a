/// Maximum length of a DNS name in presentation format
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single DNS label
const MAX_LABEL_LEN: usize = 63;

/// Normalizes a raw candidate name into a record
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Lowercase
/// 3. Strip one trailing dot (fully-qualified form)
/// 4. Reject anything that is not a hostname or a `*.` wildcard pattern
///
/// # Examples
///
/// ```
/// use san_crawler::names::normalize_name;
///
/// assert_eq!(normalize_name(" WWW.Example.COM. "), Some("www.example.com".to_string()));
/// assert_eq!(normalize_name("*.Example.com"), Some("*.example.com".to_string()));
/// assert_eq!(normalize_name("Example Corp"), None);
/// ```
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let lowered = trimmed.to_lowercase();

    if is_valid_name(&lowered) {
        Some(lowered)
    } else {
        None
    }
}

/// Returns true if `name` is a lowercase hostname or wildcard pattern
///
/// At least two labels are required; certificates routinely carry single-label
/// common names (`localhost`, appliance names) that are not useful records.
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }

    let host = name.strip_prefix("*.").unwrap_or(name);
    let labels: Vec<&str> = host.split('.').collect();

    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
