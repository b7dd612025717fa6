//! The shared crawl frontier
//!
//! The frontier is the single source of truth for what to crawl next. It
//! handles:
//! - Per-domain FIFO queues with round-robin selection across domains
//! - The politeness interval between requests to the same domain
//! - Exactly-once admission of URLs
//! - Active-download accounting for the termination check
//! - Write-through persistence and crash recovery

use crate::admission::AdmissionFilter;
use crate::config::CrawlerConfig;
use crate::state::FrontierState;
use crate::storage::{SqliteStore, StorageResult, UrlStore};
use crate::url::{normalize_url, NormalizedUrl, UrlHash};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Smallest sleep between polls, so a zero wait never spins
const MIN_POLL: Duration = Duration::from_millis(1);

/// Timing and startup options for a [`Frontier`]
#[derive(Debug, Clone, Copy)]
pub struct FrontierOptions {
    /// Minimum gap between two dequeues of the same domain
    pub politeness_interval: Duration,

    /// Upper bound on one sleep while waiting for work
    pub poll_interval: Duration,

    /// Discard persisted state and start from the seeds
    pub fresh: bool,
}

impl FrontierOptions {
    pub fn from_config(config: &CrawlerConfig, fresh: bool) -> Self {
        Self {
            politeness_interval: config.politeness_interval(),
            poll_interval: config.poll_interval(),
            fresh,
        }
    }
}

impl Default for FrontierOptions {
    fn default() -> Self {
        Self {
            politeness_interval: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            fresh: false,
        }
    }
}

/// Result of one non-blocking attempt to check out a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout {
    /// A URL is handed to the caller and counted as in flight
    Ready(NormalizedUrl),

    /// Work exists but none is eligible yet; retry after this long
    Cooldown(Duration),

    /// Nothing is queued and nothing is in flight
    Exhausted,
}

/// Everything behind the frontier lock
struct Inner {
    state: FrontierState,
    store: Box<dyn UrlStore>,
}

/// Thread-safe crawl frontier
///
/// All state, including the persistent store, sits behind one mutex so that
/// politeness and deduplication decisions are globally consistent. The lock
/// is never held across an `.await`.
pub struct Frontier {
    inner: Mutex<Inner>,
    politeness: Duration,
    poll_interval: Duration,
}

impl Frontier {
    /// Builds a frontier on top of a store, replaying what it holds
    ///
    /// Records that were admitted but never completed are re-queued in their
    /// original order. When `filter` is given, they are re-checked against it
    /// first so a tightened configuration drops stale trap URLs; dropped URLs
    /// still count as seen. If the store holds nothing after replay, the
    /// seeds are enqueued.
    ///
    /// # Arguments
    ///
    /// * `store` - The persistence backend
    /// * `options` - Timing and fresh-start options
    /// * `seeds` - URLs used when there is no persisted state
    /// * `filter` - Optional admission filter applied to replayed URLs
    pub fn open(
        mut store: Box<dyn UrlStore>,
        options: FrontierOptions,
        seeds: &[String],
        filter: Option<&AdmissionFilter>,
    ) -> StorageResult<Self> {
        if options.fresh {
            tracing::info!("Starting fresh, clearing persisted frontier");
            store.clear()?;
        }

        let records = store.load_records()?;
        let mut state = FrontierState::new();
        let mut dropped = 0;

        for record in &records {
            if record.completed {
                state.mark_completed(record.hash.clone());
                continue;
            }

            let url = match normalize_url(&record.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping persisted URL {}: {}", record.url, e);
                    state.mark_seen(record.hash.clone());
                    dropped += 1;
                    continue;
                }
            };

            if let Some(rejection) = filter.and_then(|f| f.check(url.as_str()).err()) {
                tracing::debug!("Not re-queueing {}: {}", url, rejection);
                state.mark_seen(record.hash.clone());
                dropped += 1;
                continue;
            }

            if !state.requeue(record.hash.clone(), url) {
                dropped += 1;
            }
        }

        if !records.is_empty() {
            tracing::info!(
                "Restored frontier: {} records, {} completed, {} re-queued, {} dropped",
                records.len(),
                state.completed_count(),
                state.pending_count(),
                dropped
            );
        }

        let frontier = Self {
            inner: Mutex::new(Inner { state, store }),
            politeness: options.politeness_interval,
            poll_interval: options.poll_interval.max(MIN_POLL),
        };

        if records.is_empty() {
            tracing::info!("Seeding frontier with {} URLs", seeds.len());
            for seed in seeds {
                frontier.enqueue(seed)?;
            }
        }

        Ok(frontier)
    }

    /// Builds a frontier backed by an in-memory store
    pub fn in_memory(options: FrontierOptions, seeds: &[String]) -> StorageResult<Self> {
        Self::open(Box::new(SqliteStore::open_in_memory()?), options, seeds, None)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for the next URL to crawl
    ///
    /// Sleeps while every domain with queued work is cooling down, or while
    /// the queues are empty but downloads are still in flight (they may yield
    /// new links). Returns None once nothing is queued or in flight.
    pub async fn next(&self) -> Option<NormalizedUrl> {
        loop {
            match self.try_next() {
                Checkout::Ready(url) => return Some(url),
                Checkout::Exhausted => return None,
                Checkout::Cooldown(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Tries once to check out a URL without waiting
    pub fn try_next(&self) -> Checkout {
        let mut inner = self.lock();
        let now = Instant::now();

        if let Some(url) = inner.state.take_next(now, self.politeness) {
            tracing::trace!(
                "Checked out {} ({} in flight)",
                url,
                inner.state.active_downloads()
            );
            return Checkout::Ready(url);
        }

        if !inner.state.has_pending_work() {
            return Checkout::Exhausted;
        }

        let wait = inner
            .state
            .earliest_eligible(now, self.politeness)
            .map_or(self.poll_interval, |wait| wait.min(self.poll_interval));
        Checkout::Cooldown(wait.max(MIN_POLL))
    }

    /// Admits a URL to the frontier
    ///
    /// Returns `Ok(false)` for a URL that cannot be normalized or that was
    /// admitted before. A new URL is persisted before it becomes visible.
    pub fn enqueue(&self, url: &str) -> StorageResult<bool> {
        let url = match normalize_url(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Not enqueueing {}: {}", url, e);
                return Ok(false);
            }
        };

        let mut inner = self.lock();
        if inner.state.is_seen(url.hash()) {
            return Ok(false);
        }

        inner.store.record_admitted(&url)?;
        Ok(inner.state.admit(url))
    }

    /// Reports a checked-out URL as handled, whatever the fetch outcome
    ///
    /// Completing a URL that is not checked out is a no-op returning
    /// `Ok(false)`. The in-flight count drops before the completion is
    /// persisted, so a failed write cannot stall termination.
    pub fn complete(&self, url: &NormalizedUrl) -> StorageResult<bool> {
        let mut inner = self.lock();
        if !inner.state.release(url.hash()) {
            tracing::debug!("Ignoring completion of {}: not checked out", url);
            return Ok(false);
        }

        inner.store.mark_completed(url)?;
        Ok(true)
    }

    /// True while any URL is queued or in flight
    pub fn has_pending_work(&self) -> bool {
        self.lock().state.has_pending_work()
    }

    pub fn active_downloads(&self) -> usize {
        self.lock().state.active_downloads()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().state.pending_count()
    }

    pub fn seen_count(&self) -> usize {
        self.lock().state.seen_count()
    }

    pub fn completed_count(&self) -> usize {
        self.lock().state.completed_count()
    }

    pub fn is_seen(&self, hash: &UrlHash) -> bool {
        self.lock().state.is_seen(hash)
    }

    pub fn is_completed(&self, hash: &UrlHash) -> bool {
        self.lock().state.is_completed(hash)
    }

    pub fn seen_hashes(&self) -> HashSet<UrlHash> {
        self.lock().state.seen().clone()
    }

    pub fn completed_hashes(&self) -> HashSet<UrlHash> {
        self.lock().state.completed().clone()
    }

    /// Queued URLs, grouped by domain in rotation order
    pub fn pending_urls(&self) -> Vec<NormalizedUrl> {
        self.lock().state.pending_urls()
    }

    /// When a URL of `domain` was last handed out
    pub fn last_accessed(&self, domain: &str) -> Option<Instant> {
        self.lock()
            .state
            .domain(domain)
            .and_then(|queue| queue.last_accessed())
    }

    pub fn politeness_interval(&self) -> Duration {
        self.politeness
    }

    /// Reads a metadata value from the store
    pub fn meta(&self, key: &str) -> StorageResult<Option<String>> {
        self.lock().store.get_meta(key)
    }

    /// Writes a metadata value to the store
    pub fn set_meta(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock().store.set_meta(key, value)
    }
}
