//! URL admission and crawler trap detection
//!
//! [`AdmissionFilter`] decides whether a discovered link may enter the frontier.
//! It is a pure predicate: built once from configuration, it holds no mutable
//! state and performs no I/O, so workers share one instance freely.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. Scheme (http/https) and host
//! 2. Domain allow-list, then domain deny-list
//! 3. Query-string traps (keys, `key=value` pairs, substrings)
//! 4. Path deny-lists (segments, substrings, regexes)
//! 5. Non-HTML file extensions
//! 6. Structural traps (calendars, repeated segments, length, depth, auth pages)

pub mod defaults;
mod rules;

use crate::config::AdmissionConfig;
use crate::ConfigError;
use regex::Regex;
use rules::{Candidate, KeyRule, STAGES};
use std::collections::HashSet;
use thiserror::Error;

/// Why a URL was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unparsable URL: {0}")]
    Unparsable(String),

    #[error("unsupported scheme: {0}")]
    Scheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("host {0} is outside the allowed domains")]
    DomainNotAllowed(String),

    #[error("host matches denied domain {0}")]
    DomainDenied(String),

    #[error("query trap: {0}")]
    QueryTrap(String),

    #[error("denied path: {0}")]
    PathDenied(String),

    #[error("non-HTML extension: .{0}")]
    Extension(String),

    #[error("calendar page")]
    Calendar,

    #[error("path segment repeats: {0}")]
    RepeatedSegment(String),

    #[error("URL is {0} characters long")]
    TooLong(usize),

    #[error("path is {0} segments deep")]
    TooDeep(usize),

    #[error("authentication page: {0}")]
    AuthPage(String),
}

/// Stateless admission predicate for discovered links
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    allowed_domains: Vec<String>,
    denied_domains: Vec<String>,
    trap_keys: Vec<KeyRule>,
    trap_pairs: Vec<(String, String)>,
    trap_substrings: Vec<String>,
    denied_segments: HashSet<String>,
    denied_substrings: Vec<String>,
    denied_patterns: Vec<Regex>,
    denied_extensions: HashSet<String>,
    calendar_keywords: Vec<String>,
    auth_patterns: Vec<String>,
    max_url_length: usize,
    max_path_depth: usize,
}

impl AdmissionFilter {
    /// Builds a filter from configuration
    ///
    /// Fails only if one of the configured path regexes does not compile.
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .denied_path_patterns
            .iter()
            .map(|p| {
                Regex::new(&p.to_lowercase()).map_err(|e| {
                    ConfigError::InvalidPattern(format!("Invalid path pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_patterns(config, patterns))
    }

    fn with_patterns(config: &AdmissionConfig, denied_patterns: Vec<Regex>) -> Self {
        let lower = |values: &[String]| -> Vec<String> {
            values.iter().map(|v| v.to_lowercase()).collect()
        };

        Self {
            allowed_domains: lower(&config.allowed_domains),
            denied_domains: lower(&config.denied_domains),
            trap_keys: config
                .trap_query_keys
                .iter()
                .map(|k| KeyRule::parse(k))
                .collect(),
            trap_pairs: config
                .trap_query_pairs
                .iter()
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
                .collect(),
            trap_substrings: lower(&config.trap_query_substrings),
            denied_segments: lower(&config.denied_path_segments).into_iter().collect(),
            denied_substrings: lower(&config.denied_path_substrings),
            denied_patterns,
            denied_extensions: config
                .denied_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            calendar_keywords: lower(&config.calendar_keywords),
            auth_patterns: lower(&config.auth_patterns),
            max_url_length: config.max_url_length,
            max_path_depth: config.max_path_depth,
        }
    }

    /// Returns true if the URL may enter the frontier
    ///
    /// Malformed input is never an error, only inadmissible.
    pub fn is_admissible(&self, url: &str) -> bool {
        self.check(url).is_ok()
    }

    /// Runs every stage and reports the first rejection
    pub fn check(&self, url: &str) -> Result<(), Rejection> {
        let candidate = Candidate::parse(url)?;
        STAGES.iter().try_for_each(|stage| stage(self, &candidate))
    }
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        Self::with_patterns(&AdmissionConfig::default(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> AdmissionFilter {
        AdmissionFilter::default()
    }

    #[test]
    fn test_accepts_plain_page() {
        assert!(filter().is_admissible("https://x.ics.uci.edu/about.html"));
        assert!(filter().is_admissible("https://www.stat.uci.edu/"));
        assert!(filter().is_admissible("http://ics.uci.edu/people?page=2"));
    }

    #[test]
    fn test_rejects_calendar() {
        assert_eq!(
            filter().check("https://x.ics.uci.edu/events/2023-05/"),
            Err(Rejection::Calendar)
        );
        assert_eq!(
            filter().check("https://x.ics.uci.edu/calendar/2023/05/list"),
            Err(Rejection::Calendar)
        );
        assert!(filter().is_admissible("https://x.ics.uci.edu/events/seminar"));
    }

    #[test]
    fn test_rejects_repeated_segments() {
        assert_eq!(
            filter().check("https://x.ics.uci.edu/a/b/a/b/"),
            Err(Rejection::RepeatedSegment("a".to_string()))
        );
        assert!(!filter().is_admissible(
            "https://www.ics.uci.edu/seminar-series/2022/seminar-series/"
        ));
    }

    #[test]
    fn test_rejects_long_url() {
        let prefix = "https://x.ics.uci.edu/";
        let url = format!("{}{}", prefix, "p".repeat(250 - prefix.len()));
        assert_eq!(url.len(), 250);
        assert_eq!(filter().check(&url), Err(Rejection::TooLong(250)));

        let url = format!("{}{}", prefix, "p".repeat(200 - prefix.len()));
        assert!(filter().is_admissible(&url));
    }

    #[test]
    fn test_rejects_deep_path() {
        let deep = (0..11).map(|i| format!("d{}", i)).collect::<Vec<_>>().join("/");
        let url = format!("https://x.ics.uci.edu/{}", deep);
        assert_eq!(filter().check(&url), Err(Rejection::TooDeep(11)));
    }

    #[test]
    fn test_rejects_denied_domain() {
        assert_eq!(
            filter().check("https://gitlab.ics.uci.edu/anything"),
            Err(Rejection::DomainDenied("gitlab".to_string()))
        );
    }

    #[test]
    fn test_rejects_foreign_domain() {
        assert!(matches!(
            filter().check("https://physics.uci.edu/"),
            Err(Rejection::DomainNotAllowed(_))
        ));
        assert!(!filter().is_admissible("https://ics.uci.edu.evil.com/"));
    }

    #[test]
    fn test_rejects_extension() {
        assert_eq!(
            filter().check("https://x.ics.uci.edu/page.pdf"),
            Err(Rejection::Extension("pdf".to_string()))
        );
        assert!(!filter().is_admissible("https://x.ics.uci.edu/files/DATA.CSV"));
        assert!(!filter().is_admissible("https://x.ics.uci.edu/sitemap.xml"));
    }

    #[test]
    fn test_rejects_query_traps() {
        let f = filter();
        assert!(!f.is_admissible("https://x.ics.uci.edu/post?replytocom=12"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/post?share=twitter"));
        assert!(!f.is_admissible("https://wiki.ics.uci.edu/doku.php?id=a&do=media"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/list?filter%5Btag%5D=ml"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/dir/?C=N;O=A"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/?oembed=true"));
        assert!(f.is_admissible("https://wiki.ics.uci.edu/doku.php?id=start"));
    }

    #[test]
    fn test_sort_keys_are_case_sensitive() {
        let f = filter();
        assert!(f.is_admissible("https://www.ics.uci.edu/search?c=ml"));
        assert!(f.is_admissible("https://www.ics.uci.edu/list?o=2"));
        assert_eq!(
            f.check("https://www.ics.uci.edu/dir/?C=N;O=A"),
            Err(Rejection::QueryTrap("C".to_string()))
        );
        assert!(!f.is_admissible("https://www.ics.uci.edu/dir/?O=D"));
    }

    #[test]
    fn test_rejects_path_traps() {
        let f = filter();
        assert!(!f.is_admissible("https://x.ics.uci.edu/blog/feed"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/blog/feed/atom"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/wp-json/wp/v2/posts"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/wp-login.php"));
        assert!(!f.is_admissible("https://x.ics.uci.edu/user/logout"));
        assert!(f.is_admissible("https://x.ics.uci.edu/feedback"));
    }

    #[test]
    fn test_malformed_is_inadmissible() {
        let f = filter();
        assert!(!f.is_admissible(""));
        assert!(!f.is_admissible("::::"));
        assert!(!f.is_admissible("ftp://x.ics.uci.edu/file"));
        assert!(!f.is_admissible("javascript:void(0)"));
    }

    #[test]
    fn test_custom_config() {
        let config = AdmissionConfig {
            allowed_domains: vec!["example.com".to_string()],
            denied_path_patterns: vec![r"^/tag/".to_string()],
            ..AdmissionConfig::default()
        };
        let f = AdmissionFilter::from_config(&config).unwrap();

        assert!(f.is_admissible("https://example.com/post"));
        assert!(!f.is_admissible("https://www.example.com/post"));
        assert!(matches!(
            f.check("https://example.com/tag/rust"),
            Err(Rejection::PathDenied(_))
        ));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let config = AdmissionConfig {
            denied_path_patterns: vec!["(".to_string()],
            ..AdmissionConfig::default()
        };
        assert!(matches!(
            AdmissionFilter::from_config(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
