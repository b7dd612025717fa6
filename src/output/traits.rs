//! Output handler traits and types
//!
//! This module defines the hook workers call for every processed page and the
//! errors raised while writing reports.

use crate::url::NormalizedUrl;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the text of every successfully fetched HTML page
///
/// Called concurrently from all workers, so implementations synchronize
/// internally.
pub trait PageObserver: Send + Sync {
    fn on_page_processed(&self, url: &NormalizedUrl, text: &str);
}

/// Observer that discards every page
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PageObserver for NoopObserver {
    fn on_page_processed(&self, _url: &NormalizedUrl, _text: &str) {}
}
