//! Storage module for persisting the crawl frontier
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Durable admission and completion records for crash recovery
//! - Metadata such as the configuration hash of the last run
//! - Aggregate counts for the `--stats` report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, UrlStore};

use crate::url::UrlHash;
use std::path::Path;

/// Metadata key holding the hash of the configuration that built the store
pub const CONFIG_HASH_KEY: &str = "config_hash";

/// Opens the frontier store, recovering from a corrupt file
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened storage
/// * `Err(StorageError)` - Failed to open or recover the storage
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::open_or_recover(path)
}

/// A URL as persisted: its hash, canonical form and completion flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub hash: UrlHash,
    pub url: String,
    pub completed: bool,
}

/// Store-wide record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub total: u64,
    pub completed: u64,
}

impl StoreCounts {
    /// Records admitted but not yet completed
    pub fn pending(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }
}

/// Record counts for one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCount {
    pub domain: String,
    pub total: u64,
    pub completed: u64,
}
