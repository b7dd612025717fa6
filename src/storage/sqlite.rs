//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the UrlStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, UrlStore};
use crate::storage::{DomainCount, PersistedRecord, StoreCounts};
use crate::url::{NormalizedUrl, UrlHash};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Every write must survive a crash before the call returns
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Opens the database, moving a corrupt file aside and starting empty
    ///
    /// The unreadable file is renamed to `<file>.corrupt-<timestamp>` so it can
    /// be inspected later; the crawl then starts over from its seeds.
    pub fn open_or_recover(path: &Path) -> StorageResult<Self> {
        match Self::open(path) {
            Err(StorageError::Sqlite(e)) if is_corruption(&e) => {
                let backup = corrupt_backup_path(path);
                error!(
                    "Database {} is unreadable ({}), moving it to {}",
                    path.display(),
                    e,
                    backup.display()
                );

                std::fs::rename(path, &backup).map_err(|source| StorageError::Unrecoverable {
                    path: path.to_path_buf(),
                    source,
                })?;

                // Journal files belong to the old database
                for suffix in ["-wal", "-shm"] {
                    let side = sidecar_path(path, suffix);
                    if side.exists() {
                        std::fs::remove_file(&side)?;
                    }
                }

                Self::open(path)
            }
            other => other,
        }
    }

    /// Creates an in-memory database (for tests and dry runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn is_corruption(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(inner, _)
            if matches!(inner.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    sidecar_path(
        path,
        &format!(".corrupt-{}", Utc::now().format("%Y%m%d%H%M%S")),
    )
}

impl UrlStore for SqliteStore {
    fn record_admitted(&mut self, url: &NormalizedUrl) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO urls (hash, url, domain, completed, discovered_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![url.hash().as_str(), url.as_str(), url.domain(), now],
        )?;
        Ok(())
    }

    fn mark_completed(&mut self, url: &NormalizedUrl) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO urls (hash, url, domain, completed, discovered_at, completed_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)
             ON CONFLICT(hash) DO UPDATE SET completed = 1, completed_at = excluded.completed_at",
            params![url.hash().as_str(), url.as_str(), url.domain(), now],
        )?;
        Ok(())
    }

    fn load_records(&self) -> StorageResult<Vec<PersistedRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, url, completed FROM urls ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(PersistedRecord {
                hash: UrlHash(row.get(0)?),
                url: row.get(1)?,
                completed: row.get::<_, i64>(2)? != 0,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable frontier record: {}", e),
            }
        }

        Ok(records)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM urls", [])?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_meta(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn counts(&self) -> StorageResult<StoreCounts> {
        let counts = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM urls",
            [],
            |row| {
                Ok(StoreCounts {
                    total: row.get::<_, i64>(0)? as u64,
                    completed: row.get::<_, i64>(1)? as u64,
                })
            },
        )?;
        Ok(counts)
    }

    fn domain_counts(&self) -> StorageResult<Vec<DomainCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, COUNT(*) AS total, SUM(completed)
             FROM urls GROUP BY domain ORDER BY total DESC, domain",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DomainCount {
                domain: row.get(0)?,
                total: row.get::<_, i64>(1)? as u64,
                completed: row.get::<_, i64>(2)? as u64,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
