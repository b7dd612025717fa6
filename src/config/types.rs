use crate::admission::defaults;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Longest accepted politeness delay (seconds)
pub const MAX_POLITENESS_DELAY: f64 = 3600.0;

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Minimum time between requests to the same domain (seconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: f64,

    /// How long an idle worker sleeps before asking the frontier again (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Seed URLs used when there is no persisted state
    #[serde(default)]
    pub seeds: Vec<String>,
}

impl CrawlerConfig {
    /// The politeness interval as a duration
    ///
    /// Out-of-range delays are clamped to `0..=MAX_POLITENESS_DELAY`.
    pub fn politeness_interval(&self) -> Duration {
        Duration::from_secs_f64(self.politeness_delay.max(0.0).min(MAX_POLITENESS_DELAY))
    }

    /// The idle poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            politeness_delay: default_politeness_delay(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout: default_request_timeout(),
            seeds: Vec::new(),
        }
    }
}

fn default_threads() -> usize {
    4
}

fn default_politeness_delay() -> f64 {
    0.5
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_request_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PoliteFrontier".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/crawler".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite file holding the persisted frontier
    #[serde(rename = "save-file")]
    pub save_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_file: "frontier.db".to_string(),
        }
    }
}

/// URL admission and trap detection configuration
///
/// Every list defaults to the rules tuned for the UCI crawl; a section in the
/// config file replaces only the keys it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Host patterns a URL must match (`*.example.com`, `.example.com`, `example.com`)
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Host patterns that are never crawled, checked after the allow-list
    #[serde(rename = "denied-domains")]
    pub denied_domains: Vec<String>,

    /// Query keys that generate endless URL variants (`name` or `prefix*`);
    /// keys containing uppercase letters match case-sensitively
    #[serde(rename = "trap-query-keys")]
    pub trap_query_keys: Vec<String>,

    /// Exact `key=value` query pairs that are traps
    #[serde(rename = "trap-query-pairs")]
    pub trap_query_pairs: Vec<String>,

    /// Substrings that reject a query wherever they appear
    #[serde(rename = "trap-query-substrings")]
    pub trap_query_substrings: Vec<String>,

    /// Path segments that mark non-content paths (e.g. syndication feeds)
    #[serde(rename = "denied-path-segments")]
    pub denied_path_segments: Vec<String>,

    /// Path substrings that mark non-content paths
    #[serde(rename = "denied-path-substrings")]
    pub denied_path_substrings: Vec<String>,

    /// Regular expressions matched against the lowercase path
    #[serde(rename = "denied-path-patterns")]
    pub denied_path_patterns: Vec<String>,

    /// File extensions that are never HTML
    #[serde(rename = "denied-extensions")]
    pub denied_extensions: Vec<String>,

    /// Path words that mark calendar-like pages when paired with a date
    #[serde(rename = "calendar-keywords")]
    pub calendar_keywords: Vec<String>,

    /// Path substrings for login/logout/admin pages
    #[serde(rename = "auth-patterns")]
    pub auth_patterns: Vec<String>,

    /// Maximum total URL length in characters
    #[serde(rename = "max-url-length")]
    pub max_url_length: usize,

    /// Maximum number of path segments
    #[serde(rename = "max-path-depth")]
    pub max_path_depth: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            allowed_domains: defaults::owned(defaults::ALLOWED_DOMAINS),
            denied_domains: defaults::owned(defaults::DENIED_DOMAINS),
            trap_query_keys: defaults::owned(defaults::TRAP_QUERY_KEYS),
            trap_query_pairs: defaults::owned(defaults::TRAP_QUERY_PAIRS),
            trap_query_substrings: defaults::owned(defaults::TRAP_QUERY_SUBSTRINGS),
            denied_path_segments: defaults::owned(defaults::DENIED_PATH_SEGMENTS),
            denied_path_substrings: defaults::owned(defaults::DENIED_PATH_SUBSTRINGS),
            denied_path_patterns: Vec::new(),
            denied_extensions: defaults::owned(defaults::DENIED_EXTENSIONS),
            calendar_keywords: defaults::owned(defaults::CALENDAR_KEYWORDS),
            auth_patterns: defaults::owned(defaults::AUTH_PATTERNS),
            max_url_length: defaults::MAX_URL_LENGTH,
            max_path_depth: defaults::MAX_PATH_DEPTH,
        }
    }
}

/// Analytics report configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Path of the JSON report
    #[serde(rename = "json-path")]
    pub json_path: String,

    /// Path of the plain-text report
    #[serde(rename = "text-path")]
    pub text_path: String,

    /// Only hosts under this domain are counted per subdomain
    #[serde(rename = "subdomain-root")]
    pub subdomain_root: String,

    /// Number of most frequent words to report
    #[serde(rename = "top-words")]
    pub top_words: usize,

    /// Pages with fewer tokens are left out of the analytics
    #[serde(rename = "min-page-tokens")]
    pub min_page_tokens: usize,

    /// Maximum count a single page contributes for one word
    #[serde(rename = "per-page-word-cap")]
    pub per_page_word_cap: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            json_path: "report.json".to_string(),
            text_path: "report.txt".to_string(),
            subdomain_root: "uci.edu".to_string(),
            top_words: 50,
            min_page_tokens: 50,
            per_page_word_cap: 10,
        }
    }
}
