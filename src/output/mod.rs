//! Output module for crawl analytics and reports
//!
//! This module handles:
//! - The page hook workers call for every fetched HTML page
//! - Word, page and subdomain analytics
//! - JSON and plain-text reports
//! - Store statistics for `--stats`

mod analytics;
mod report;
pub mod stats;
mod traits;

pub use analytics::{tokenize, PageAnalytics};
pub use report::{LongestPage, Report, WordCount};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{NoopObserver, OutputError, OutputResult, PageObserver};
