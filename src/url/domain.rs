use url::Url;

/// Extracts the domain (lowercase host) from a URL
///
/// The domain is the politeness and queuing unit of the frontier. Ports are not
/// part of it, so two servers on one host share a cooldown.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_frontier::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `host` is `root` itself or one of its subdomains
///
/// Used to decide which hosts count towards the per-subdomain report.
pub fn is_within(host: &str, root: &str) -> bool {
    let root = root.trim_start_matches('.');
    !root.is_empty()
        && (host == root
            || host
                .strip_suffix(root)
                .is_some_and(|prefix| prefix.ends_with('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://vision.ics.uci.edu/post").unwrap();
        assert_eq!(extract_domain(&url), Some("vision.ics.uci.edu".to_string()));
    }

    #[test]
    fn test_extract_ignores_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://WWW.Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("www.example.com".to_string()));
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("uci.edu", "uci.edu"));
        assert!(is_within("ics.uci.edu", "uci.edu"));
        assert!(is_within("a.b.uci.edu", ".uci.edu"));
        assert!(!is_within("notuci.edu", "uci.edu"));
        assert!(!is_within("uci.edu.evil.com", "uci.edu"));
        assert!(!is_within("uci.edu", ""));
    }
}
