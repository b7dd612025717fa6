//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier with per-domain politeness
//! - HTTP fetching and HTML link/text extraction
//! - The worker loop and the worker pool coordinator

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod worker;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher, Response, MAX_REDIRECTS};
pub use frontier::{Checkout, Frontier, FrontierOptions};
pub use parser::{parse_links, parse_text, ExtractError, ExtractedPage, Extractor, HtmlExtractor};
pub use worker::{Worker, WorkerState, WorkerSummary};

use crate::config::Config;
use crate::output::{PageAnalytics, Report};
use crate::CrawlError;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the frontier store, resuming or starting fresh
/// 2. Spawn the worker pool and wait for the frontier to drain
/// 3. Stop the workers early on Ctrl-C
/// 4. Write the analytics report either way
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file
/// * `fresh` - Whether to discard persisted state
///
/// # Returns
///
/// * `Ok(Report)` - The analytics of this run
/// * `Err(CrawlError)` - Crawl failed
pub async fn crawl(config: &Config, config_hash: &str, fresh: bool) -> Result<Report, CrawlError> {
    let analytics = Arc::new(PageAnalytics::new(&config.report));
    let mut coordinator = Coordinator::new(config, config_hash, fresh, analytics.clone())?;

    coordinator.start()?;
    let interrupted = tokio::select! {
        result = coordinator.join() => {
            result?;
            false
        }
        _ = interrupted_by(tokio::signal::ctrl_c()) => true,
    };

    if interrupted {
        tracing::warn!("Interrupted, stopping crawl");
        coordinator.shutdown().await;
    }

    let report = analytics.report();
    report.write(
        Path::new(&config.report.json_path),
        Path::new(&config.report.text_path),
    )?;
    Ok(report)
}

/// Resolves when `signal` fires
///
/// A signal that cannot be listened for never resolves, so a missing handler
/// does not read as an interrupt.
async fn interrupted_by<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Cannot listen for Ctrl-C, crawl will run to completion: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_fires_interrupt() {
        let fired = tokio::time::timeout(Duration::from_secs(1), interrupted_by(async { Ok(()) }));
        assert!(fired.await.is_ok());
    }

    #[tokio::test]
    async fn test_signal_failure_is_not_interrupt() {
        let failed = async { Err(std::io::Error::other("no signal handler")) };
        let fired = tokio::time::timeout(Duration::from_millis(50), interrupted_by(failed));
        assert!(fired.await.is_err());
    }
}
