use crate::url::NormalizedUrl;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Pending work and politeness timing for one domain
///
/// A queue is created the first time a URL for its domain is admitted. Until
/// its first dequeue it has no access time and is always eligible.
#[derive(Debug, Clone, Default)]
pub struct DomainQueue {
    /// URLs waiting to be fetched, oldest first
    pending: VecDeque<NormalizedUrl>,

    /// When a URL was last handed out for this domain
    last_accessed: Option<Instant>,
}

impl DomainQueue {
    /// Creates an empty queue with no access history
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL to the back of the queue
    pub fn push(&mut self, url: NormalizedUrl) {
        self.pending.push_back(url);
    }

    /// Dequeues the head URL and records the access time
    ///
    /// Returns None (and leaves the access time alone) if the queue is empty.
    pub fn take(&mut self, now: Instant) -> Option<NormalizedUrl> {
        let url = self.pending.pop_front()?;
        self.last_accessed = Some(now);
        Some(url)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterates pending URLs in dequeue order
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedUrl> {
        self.pending.iter()
    }

    pub fn last_accessed(&self) -> Option<Instant> {
        self.last_accessed
    }

    /// Checks whether the cooldown since the last access has elapsed
    ///
    /// # Arguments
    ///
    /// * `now` - The current time instant
    /// * `interval` - The politeness interval for this domain
    pub fn is_eligible(&self, now: Instant, interval: Duration) -> bool {
        self.time_until_eligible(now, interval).is_none()
    }

    /// Calculates the time until the next dequeue is allowed
    ///
    /// Returns None if a dequeue can happen now, or the duration to wait otherwise.
    pub fn time_until_eligible(&self, now: Instant, interval: Duration) -> Option<Duration> {
        let last = self.last_accessed?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }
}
