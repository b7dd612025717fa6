//! Storage traits and error types
//!
//! This module defines the trait interface for frontier persistence backends
//! and associated error types.

use crate::storage::{DomainCount, PersistedRecord, StoreCounts};
use crate::url::NormalizedUrl;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database {path} is corrupt and could not be moved aside: {source}")]
    Unrecoverable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable mapping from URL hash to URL and completion flag
///
/// Every write must be durable before the call returns, so that a crash never
/// leaves the store behind the in-memory frontier.
pub trait UrlStore: Send {
    /// Records a newly admitted URL; an already-known hash is left untouched
    fn record_admitted(&mut self, url: &NormalizedUrl) -> StorageResult<()>;

    /// Marks a URL completed, inserting it first if it was never recorded
    fn mark_completed(&mut self, url: &NormalizedUrl) -> StorageResult<()>;

    /// Loads every readable record in admission order
    ///
    /// Rows that cannot be decoded are skipped; the URL is then simply
    /// re-crawled if it is discovered again.
    fn load_records(&self) -> StorageResult<Vec<PersistedRecord>>;

    /// Removes all records (used for a fresh crawl)
    fn clear(&mut self) -> StorageResult<()>;

    /// Reads a metadata value
    fn get_meta(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a metadata value
    fn set_meta(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Total and completed record counts
    fn counts(&self) -> StorageResult<StoreCounts>;

    /// Record counts grouped by domain, busiest first
    fn domain_counts(&self) -> StorageResult<Vec<DomainCount>>;
}
