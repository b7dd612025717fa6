use crate::state::DomainQueue;
use crate::url::{NormalizedUrl, UrlHash};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// In-memory bookkeeping of the frontier
///
/// Holds the per-domain queues, the round-robin rotation over them, and the
/// seen / checked-out / completed hash sets. It performs no I/O and no
/// locking; the [`Frontier`](crate::crawler::Frontier) wraps it together with
/// the persistent store behind a single mutex.
#[derive(Debug, Default)]
pub struct FrontierState {
    domains: HashMap<String, DomainQueue>,

    /// Domains in first-seen order; the round-robin walks this list
    rotation: Vec<String>,

    /// Index in `rotation` where the next search starts
    cursor: usize,

    /// Every URL ever admitted
    seen: HashSet<UrlHash>,

    /// URLs handed out and not yet completed
    checked_out: HashSet<UrlHash>,

    completed: HashSet<UrlHash>,

    /// Total URLs across all domain queues
    queued: usize,
}

impl FrontierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the hash has been admitted before
    pub fn is_seen(&self, hash: &UrlHash) -> bool {
        self.seen.contains(hash)
    }

    pub fn is_completed(&self, hash: &UrlHash) -> bool {
        self.completed.contains(hash)
    }

    pub fn is_checked_out(&self, hash: &UrlHash) -> bool {
        self.checked_out.contains(hash)
    }

    /// Marks a hash as seen without queueing it
    ///
    /// Used when replaying records that are completed or no longer admissible.
    pub fn mark_seen(&mut self, hash: UrlHash) {
        self.seen.insert(hash);
    }

    /// Marks a hash as seen and completed
    pub fn mark_completed(&mut self, hash: UrlHash) {
        self.seen.insert(hash.clone());
        self.completed.insert(hash);
    }

    /// Queues a URL that has not been seen before
    ///
    /// Returns false, leaving everything untouched, if the URL is a duplicate.
    pub fn admit(&mut self, url: NormalizedUrl) -> bool {
        if !self.seen.insert(url.hash().clone()) {
            return false;
        }
        self.push(url);
        true
    }

    /// Queues a replayed URL that was persisted under `hash`
    ///
    /// The persisted hash is trusted for deduplication even if the URL would
    /// hash differently today. Returns false if the URL now duplicates an
    /// earlier record.
    pub fn requeue(&mut self, hash: UrlHash, url: NormalizedUrl) -> bool {
        let duplicate = *url.hash() != hash && self.seen.contains(url.hash());
        self.seen.insert(hash);
        if duplicate {
            return false;
        }
        self.seen.insert(url.hash().clone());
        self.push(url);
        true
    }

    fn push(&mut self, url: NormalizedUrl) {
        if !self.domains.contains_key(url.domain()) {
            self.rotation.push(url.domain().to_string());
        }
        self.domains
            .entry(url.domain().to_string())
            .or_default()
            .push(url);
        self.queued += 1;
    }

    /// Hands out the head URL of the next eligible domain in rotation
    ///
    /// The chosen domain's access time is set to `now` and the URL is counted
    /// as checked out. Returns None if no non-empty domain is eligible.
    pub fn take_next(&mut self, now: Instant, interval: Duration) -> Option<NormalizedUrl> {
        let count = self.rotation.len();
        for offset in 0..count {
            let index = (self.cursor + offset) % count;
            let Some(queue) = self.domains.get_mut(&self.rotation[index]) else {
                continue;
            };

            if queue.is_empty() || !queue.is_eligible(now, interval) {
                continue;
            }

            if let Some(url) = queue.take(now) {
                self.cursor = (index + 1) % count;
                self.queued -= 1;
                self.checked_out.insert(url.hash().clone());
                return Some(url);
            }
        }
        None
    }

    /// Time until the first non-empty domain leaves its cooldown
    ///
    /// None if nothing is queued.
    pub fn earliest_eligible(&self, now: Instant, interval: Duration) -> Option<Duration> {
        self.domains
            .values()
            .filter(|queue| !queue.is_empty())
            .map(|queue| queue.time_until_eligible(now, interval).unwrap_or(Duration::ZERO))
            .min()
    }

    /// Moves a checked-out hash to completed
    ///
    /// Returns false if the hash was not checked out.
    pub fn release(&mut self, hash: &UrlHash) -> bool {
        if !self.checked_out.remove(hash) {
            return false;
        }
        self.completed.insert(hash.clone());
        true
    }

    /// True while anything is queued or in flight
    pub fn has_pending_work(&self) -> bool {
        self.queued > 0 || !self.checked_out.is_empty()
    }

    pub fn active_downloads(&self) -> usize {
        self.checked_out.len()
    }

    pub fn pending_count(&self) -> usize {
        self.queued
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// The queue of one domain, if it has ever had a URL
    pub fn domain(&self, domain: &str) -> Option<&DomainQueue> {
        self.domains.get(domain)
    }

    pub fn seen(&self) -> &HashSet<UrlHash> {
        &self.seen
    }

    pub fn completed(&self) -> &HashSet<UrlHash> {
        &self.completed
    }

    /// Pending URLs, domain by domain in rotation order
    pub fn pending_urls(&self) -> Vec<NormalizedUrl> {
        self.rotation
            .iter()
            .filter_map(|domain| self.domains.get(domain))
            .flat_map(|queue| queue.iter().cloned())
            .collect()
    }
}
