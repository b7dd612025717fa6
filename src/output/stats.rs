//! Statistics generation from the frontier store
//!
//! This module provides functionality for extracting and displaying
//! crawl progress from the storage layer.

use crate::storage::{DomainCount, StorageResult, StoreCounts, UrlStore, CONFIG_HASH_KEY};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Record counts across the whole store
    pub totals: StoreCounts,

    /// Record counts per domain, busiest first
    pub domains: Vec<DomainCount>,

    /// Hash of the configuration that last wrote the store
    pub config_hash: Option<String>,
}

impl CrawlStatistics {
    /// Completed records as a percentage of all records
    pub fn completion_rate(&self) -> f64 {
        if self.totals.total == 0 {
            0.0
        } else {
            (self.totals.completed as f64 / self.totals.total as f64) * 100.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &dyn UrlStore) -> StorageResult<CrawlStatistics> {
    let totals = store.counts()?;

    let mut domains = store.domain_counts()?;
    domains.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.domain.cmp(&b.domain)));

    let config_hash = store.get_meta(CONFIG_HASH_KEY)?;

    Ok(CrawlStatistics {
        totals,
        domains,
        config_hash,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs admitted: {}", stats.totals.total);
    println!("  Completed: {}", stats.totals.completed);
    println!("  Pending: {}", stats.totals.pending());
    println!("  Domains: {}", stats.domains.len());
    if let Some(hash) = &stats.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!();

    if !stats.domains.is_empty() {
        println!("URLs by Domain:");
        for entry in &stats.domains {
            println!(
                "  {}: {} admitted, {} completed",
                entry.domain, entry.total, entry.completed
            );
        }
        println!();
    }

    println!(
        "Completion: {:.1}% ({} / {} URLs)",
        stats.completion_rate(),
        stats.totals.completed,
        stats.totals.total
    );
}
