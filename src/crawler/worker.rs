//! Crawl worker
//!
//! A worker repeatedly checks a URL out of the frontier, fetches it, hands
//! HTML pages to the extractor and the page observer, feeds admissible links
//! back into the frontier and reports the URL complete. Failures of any kind,
//! panics included, leave the worker running with zero links for that URL.

use crate::admission::AdmissionFilter;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::Extractor;
use crate::output::PageObserver;
use crate::url::NormalizedUrl;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

/// How often a worker logs frontier progress, in pages
const PROGRESS_INTERVAL: usize = 100;

/// Lifecycle of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Done,
}

/// What one worker did over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub id: usize,

    /// URLs handled, whatever the outcome
    pub pages: usize,

    /// URLs whose fetch failed, returned a non-2xx status or panicked
    pub failures: usize,

    /// Links this worker admitted to the frontier
    pub links_enqueued: usize,
}

/// Reasons a page yields no links
#[derive(Debug, Error)]
enum PageFailure {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    state: WorkerState,
    frontier: Arc<Frontier>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    filter: Arc<AdmissionFilter>,
    observer: Arc<dyn PageObserver>,
}

impl Worker {
    pub fn new(
        id: usize,
        frontier: Arc<Frontier>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        filter: Arc<AdmissionFilter>,
        observer: Arc<dyn PageObserver>,
    ) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            frontier,
            fetcher,
            extractor,
            filter,
            observer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs until the frontier has no work left
    pub async fn run(&mut self) -> WorkerSummary {
        self.state = WorkerState::Running;
        let mut summary = WorkerSummary {
            id: self.id,
            ..WorkerSummary::default()
        };
        tracing::debug!("Worker {} started", self.id);

        while let Some(url) = self.frontier.next().await {
            let links = match AssertUnwindSafe(self.process(&url)).catch_unwind().await {
                Ok(Ok(links)) => links,
                Ok(Err(e)) => {
                    tracing::warn!("Failed to download {}: {}", url, e);
                    summary.failures += 1;
                    Vec::new()
                }
                Err(_) => {
                    tracing::error!("Worker {} panicked while processing {}", self.id, url);
                    summary.failures += 1;
                    Vec::new()
                }
            };

            summary.links_enqueued += self.enqueue_admissible(&url, links);

            if let Err(e) = self.frontier.complete(&url) {
                tracing::error!("Failed to persist completion of {}: {}", url, e);
            }

            summary.pages += 1;
            if summary.pages % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Worker {}: {} pages, {} queued, {} in flight, {} completed",
                    self.id,
                    summary.pages,
                    self.frontier.pending_count(),
                    self.frontier.active_downloads(),
                    self.frontier.completed_count()
                );
            }
        }

        self.state = WorkerState::Done;
        tracing::debug!(
            "Worker {} done: {} pages, {} failures",
            self.id,
            summary.pages,
            summary.failures
        );
        summary
    }

    /// Fetches one URL and returns the links found on it
    async fn process(&self, url: &NormalizedUrl) -> Result<Vec<String>, PageFailure> {
        let response = self.fetcher.fetch(url).await?;
        tracing::info!("Downloaded {}, status <{}>", url, response.status);

        if !response.is_success() {
            return Err(PageFailure::Status(response.status));
        }

        if !response.is_html() {
            tracing::debug!("Not following {}: {}", url, response.content_type());
            return Ok(Vec::new());
        }

        match self.extractor.extract_page(url, &response) {
            Ok(page) => {
                self.observer.on_page_processed(url, &page.text);
                Ok(page.links)
            }
            Err(e) => {
                tracing::warn!("Failed to extract {}: {}", url, e);
                Ok(Vec::new())
            }
        }
    }

    /// Filters links and enqueues the survivors, returning how many were new
    fn enqueue_admissible(&self, source: &NormalizedUrl, links: Vec<String>) -> usize {
        let mut added = 0;
        for link in links {
            if let Err(rejection) = self.filter.check(&link) {
                tracing::trace!("Rejected {}: {}", link, rejection);
                continue;
            }

            match self.frontier.enqueue(&link) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => tracing::error!("Failed to persist {} (found on {}): {}", link, source, e),
            }
        }
        added
    }
}
