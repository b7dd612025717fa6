//! Crawler coordinator - worker pool orchestration
//!
//! This module owns the frontier and the worker pool:
//! - Opening the frontier store and restoring or seeding the frontier
//! - Checking the configuration hash of a resumed crawl
//! - Spawning a fixed number of workers and waiting for them
//! - Aborting the pool on interrupt

use crate::admission::AdmissionFilter;
use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, FrontierOptions};
use crate::crawler::parser::{Extractor, HtmlExtractor};
use crate::crawler::worker::{Worker, WorkerSummary};
use crate::output::PageObserver;
use crate::storage::{open_store, StorageResult, CONFIG_HASH_KEY};
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    frontier: Arc<Frontier>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    filter: Arc<AdmissionFilter>,
    observer: Arc<dyn PageObserver>,
    threads: usize,
    workers: Option<JoinSet<WorkerSummary>>,
    started_at: Option<Instant>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash of the configuration file, stored for resumes
    /// * `fresh` - Whether to start a fresh crawl (clears existing data)
    /// * `observer` - Receives the text of every fetched HTML page
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Failed to initialize
    pub fn new(
        config: &Config,
        config_hash: &str,
        fresh: bool,
        observer: Arc<dyn PageObserver>,
    ) -> Result<Self, CrawlError> {
        let filter = AdmissionFilter::from_config(&config.admission)?;

        let store = open_store(Path::new(&config.storage.save_file))?;
        let frontier = Frontier::open(
            Box::new(store),
            FrontierOptions::from_config(&config.crawler, fresh),
            &config.crawler.seeds,
            Some(&filter),
        )?;
        check_config_hash(&frontier, config_hash)?;

        let fetcher = HttpFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout),
        )?;

        Ok(Self::with_collaborators(
            Arc::new(frontier),
            Arc::new(fetcher),
            Arc::new(HtmlExtractor::new()),
            Arc::new(filter),
            observer,
            config.crawler.threads,
        ))
    }

    /// Creates a coordinator around an existing frontier and collaborators
    pub fn with_collaborators(
        frontier: Arc<Frontier>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        filter: Arc<AdmissionFilter>,
        observer: Arc<dyn PageObserver>,
        threads: usize,
    ) -> Self {
        Self {
            frontier,
            fetcher,
            extractor,
            filter,
            observer,
            threads: threads.max(1),
            workers: None,
            started_at: None,
        }
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_started(&self) -> bool {
        self.workers.is_some()
    }

    /// Spawns the worker pool without waiting for it
    ///
    /// Must be called from within a tokio runtime. Fails if the pool was
    /// already started.
    pub fn start(&mut self) -> Result<(), CrawlError> {
        if self.workers.is_some() {
            return Err(CrawlError::AlreadyStarted);
        }

        tracing::info!(
            "Starting {} workers ({} URLs queued)",
            self.threads,
            self.frontier.pending_count()
        );

        let mut workers = JoinSet::new();
        for id in 0..self.threads {
            let mut worker = Worker::new(
                id,
                Arc::clone(&self.frontier),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                Arc::clone(&self.filter),
                Arc::clone(&self.observer),
            );
            workers.spawn(async move { worker.run().await });
        }

        self.workers = Some(workers);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Waits for every started worker to finish
    ///
    /// Returns the worker summaries ordered by worker id; empty if the pool
    /// was never started.
    pub async fn join(&mut self) -> Result<Vec<WorkerSummary>, CrawlError> {
        let Some(workers) = self.workers.as_mut() else {
            return Ok(Vec::new());
        };

        let mut summaries = Vec::with_capacity(self.threads);
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) if e.is_cancelled() => tracing::debug!("Worker cancelled"),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        summaries.sort_by_key(|s| s.id);

        let pages: usize = summaries.iter().map(|s| s.pages).sum();
        let failures: usize = summaries.iter().map(|s| s.failures).sum();
        tracing::info!(
            "Crawl completed: {} pages ({} failed) in {:?}, {} URLs seen",
            pages,
            failures,
            self.started_at.map(|t| t.elapsed()).unwrap_or_default(),
            self.frontier.seen_count()
        );

        Ok(summaries)
    }

    /// Starts the pool and waits for it
    pub async fn run(&mut self) -> Result<Vec<WorkerSummary>, CrawlError> {
        self.start()?;
        self.join().await
    }

    /// Aborts all workers
    ///
    /// URLs that were in flight stay uncompleted in the store and are
    /// re-queued on the next resume.
    pub async fn shutdown(&mut self) {
        if let Some(workers) = self.workers.as_mut() {
            tracing::info!(
                "Stopping workers ({} downloads in flight)",
                self.frontier.active_downloads()
            );
            workers.abort_all();
            while workers.join_next().await.is_some() {}
        }
    }
}

/// Warns when resuming with a different configuration, then records the current one
fn check_config_hash(frontier: &Frontier, config_hash: &str) -> StorageResult<()> {
    match frontier.meta(CONFIG_HASH_KEY)? {
        Some(previous) if previous != config_hash => {
            tracing::warn!(
                "Configuration changed since the last run (was {}, now {})",
                previous,
                config_hash
            );
        }
        _ => {}
    }
    frontier.set_meta(CONFIG_HASH_KEY, config_hash)
}
