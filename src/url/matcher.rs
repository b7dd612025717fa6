/// Checks if a host matches a domain pattern
///
/// Three pattern forms are supported:
/// 1. Wildcard: "*.example.com" or ".example.com" match "example.com" and any
///    subdomain such as "blog.example.com" or "api.v2.example.com"
/// 2. Exact: "example.com" matches only "example.com"
/// 3. Label: a pattern without dots, such as "gitlab", matches any host that has
///    it as one of its labels ("gitlab.ics.uci.edu", "www.gitlab.com")
///
/// Hosts are expected to be lowercase already; patterns are compared as-is.
///
/// # Examples
///
/// ```
/// use polite_frontier::url::matches_domain;
///
/// assert!(matches_domain("*.ics.uci.edu", "ics.uci.edu"));
/// assert!(matches_domain(".ics.uci.edu", "vision.ics.uci.edu"));
/// assert!(!matches_domain("*.ics.uci.edu", "physics.uci.edu"));
/// assert!(matches_domain("gitlab", "gitlab.ics.uci.edu"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    if pattern.is_empty() || host.is_empty() {
        return false;
    }

    if let Some(base) = pattern
        .strip_prefix("*.")
        .or_else(|| pattern.strip_prefix('.'))
    {
        return host == base || host.ends_with(&format!(".{}", base));
    }

    if pattern.contains('.') {
        host == pattern
    } else {
        host.split('.').any(|label| label == pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_domain("example.com", "example.com"));
        assert!(!matches_domain("example.com", "blog.example.com"));
        assert!(!matches_domain("blog.example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_domain() {
        assert!(matches_domain("*.example.com", "example.com"));
        assert!(matches_domain(".example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_matches_nested_subdomains() {
        assert!(matches_domain("*.example.com", "api.v2.example.com"));
        assert!(matches_domain(".stat.uci.edu", "www.stat.uci.edu"));
    }

    #[test]
    fn test_wildcard_no_match_partial() {
        assert!(!matches_domain("*.example.com", "myexample.com"));
        assert!(!matches_domain("*.example.com", "example.com.org"));
        assert!(!matches_domain(".cs.uci.edu", "ics.uci.edu"));
    }

    #[test]
    fn test_label_pattern() {
        assert!(matches_domain("gitlab", "gitlab.ics.uci.edu"));
        assert!(matches_domain("gitlab", "code.gitlab.com"));
        assert!(!matches_domain("gitlab", "mygitlab.ics.uci.edu"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(!matches_domain("*.example.com", ""));
        assert!(!matches_domain("", "example.com"));
        assert!(!matches_domain("", ""));
    }

    #[test]
    fn test_ip_host() {
        assert!(matches_domain("127.0.0.1", "127.0.0.1"));
        assert!(!matches_domain("127.0.0.1", "127.0.0.2"));
    }
}
