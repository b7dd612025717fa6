//! HTTP fetcher implementation
//!
//! This module defines the transport seam of the crawler:
//! - The `Fetcher` trait workers call for every checked-out URL
//! - The `Response` handed to the extractor
//! - `HttpFetcher`, the reqwest-backed default
//! - Error classification for failed requests

use crate::config::UserAgentConfig;
use crate::url::NormalizedUrl;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// Errors raised by a fetch
///
/// A non-success HTTP status is not an error; it comes back as a
/// [`Response`] whose `status` the worker inspects.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Redirect error: {0}")]
    Redirect(String),

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_redirect() {
            FetchError::Redirect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects; relative links resolve against it
    pub final_url: Url,

    /// Response headers with lowercase names
    pub headers: HashMap<String, String>,

    /// Body bytes (empty for non-textual content types)
    pub content: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The Content-Type header, lowercased
    pub fn content_type(&self) -> String {
        self.headers
            .get("content-type")
            .map(|v| v.to_lowercase())
            .unwrap_or_default()
    }

    pub fn is_html(&self) -> bool {
        let content_type = self.content_type();
        content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
    }

    /// The body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// Transport collaborator used by workers
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one URL
    async fn fetch(&self, url: &NormalizedUrl) -> Result<Response, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use polite_frontier::config::UserAgentConfig;
/// use polite_frontier::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Default fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, timeout)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &NormalizedUrl) -> Result<Response, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        // Binary bodies are never parsed, so don't download them
        let textual = headers
            .get("content-type")
            .map(|ct| is_textual(ct))
            .unwrap_or(true);

        let content = if textual {
            response.bytes().await?.to_vec()
        } else {
            Vec::new()
        };

        Ok(Response {
            status,
            final_url,
            headers,
            content,
        })
    }
}

fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    content_type.starts_with("text/") || content_type.contains("xml") || content_type.contains("json")
}
