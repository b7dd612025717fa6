//! URL handling module
//!
//! This module provides URL normalization, the deduplication hash, domain
//! extraction and domain pattern matching.

mod domain;
mod matcher;
mod normalize;

use std::fmt;
use std::str::FromStr;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, is_within};
pub use matcher::matches_domain;
pub use normalize::{normalize_url, url_hash};

/// Stable digest of a normalized URL, used as the deduplication key
///
/// Hex-encoded SHA-256 over host, port, path and query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlHash(pub(crate) String);

impl UrlHash {
    /// Returns the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A URL in canonical crawl form, together with its domain and hash
///
/// Only [`normalize_url`] constructs these, so every instance satisfies the
/// normalization rules.
#[derive(Debug, Clone)]
pub struct NormalizedUrl {
    url: Url,
    domain: String,
    hash: UrlHash,
}

impl NormalizedUrl {
    /// The canonical URL string
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The parsed URL
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// The lowercase host, used as the politeness unit
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The deduplication hash
    pub fn hash(&self) -> &UrlHash {
        &self.hash
    }
}

impl PartialEq for NormalizedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for NormalizedUrl {}

impl std::hash::Hash for NormalizedUrl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl FromStr for NormalizedUrl {
    type Err = crate::UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_url(s)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
