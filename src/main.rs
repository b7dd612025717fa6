//! Polite Frontier main entry point
//!
//! This is the command-line interface for the polite-frontier crawler.

use anyhow::Context;
use clap::Parser;
use polite_frontier::config::{load_config_with_hash, Config};
use polite_frontier::crawler::crawl;
use polite_frontier::output::{load_statistics, print_statistics};
use polite_frontier::storage::open_store;
use polite_frontier::{normalize_url, AdmissionFilter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Polite Frontier: a polite, multi-threaded web crawler
///
/// Crawls an allow-list of domains with a minimum delay between requests to
/// the same host, skips known crawler traps, and resumes an interrupted crawl
/// from its saved frontier.
#[derive(Parser, Debug)]
#[command(name = "polite-frontier")]
#[command(version)]
#[command(about = "A polite, multi-threaded web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the saved frontier (default behavior)
    #[arg(long, conflicts_with = "restart")]
    resume: bool,

    /// Discard the saved frontier and start again from the seeds
    #[arg(long, conflicts_with = "resume")]
    restart: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "check"])]
    dry_run: bool,

    /// Show statistics from the saved frontier and exit
    #[arg(long, conflicts_with_all = ["dry_run", "check"])]
    stats: bool,

    /// Show whether a URL would be admitted, and why not, then exit
    #[arg(long, value_name = "URL", conflicts_with_all = ["dry_run", "stats"])]
    check: Option<String>,
}

impl Cli {
    /// Whether to discard the saved frontier; resuming is the default
    fn fresh_start(&self) -> bool {
        self.restart && !self.resume
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(url) = cli.check.as_deref() {
        handle_check(&config, url)
    } else {
        handle_crawl(&config, &config_hash, cli.fresh_start()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "polite_frontier=info,warn",
            1 => "polite_frontier=debug,info",
            2 => "polite_frontier=trace,debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let filter = AdmissionFilter::from_config(&config.admission)?;

    println!("=== Polite Frontier Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.threads);
    println!("  Politeness delay: {}s", config.crawler.politeness_delay);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStorage:");
    println!("  Save file: {}", config.storage.save_file);
    println!("  Report: {} / {}", config.report.json_path, config.report.text_path);

    println!("\nAllowed Domains ({}):", config.admission.allowed_domains.len());
    for pattern in &config.admission.allowed_domains {
        println!("  - {}", pattern);
    }

    println!("\nDenied Domains ({}):", config.admission.denied_domains.len());
    for pattern in &config.admission.denied_domains {
        println!("  - {}", pattern);
    }

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    let mut admitted = 0;
    for seed in &config.crawler.seeds {
        match filter.check(seed) {
            Ok(()) => {
                admitted += 1;
                println!("  ✓ {}", seed);
            }
            Err(rejection) => println!("  ✗ {} ({})", seed, rejection),
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ {} of {} seeds pass the admission filter",
        admitted,
        config.crawler.seeds.len()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the saved frontier
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.storage.save_file);
    println!("Save file: {}\n", path.display());

    if !path.exists() {
        println!("No saved frontier found");
        return Ok(());
    }

    let store = open_store(path)
        .with_context(|| format!("Failed to open save file {}", path.display()))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --check mode: shows the admission decision for one URL
fn handle_check(config: &Config, url: &str) -> anyhow::Result<()> {
    let filter = AdmissionFilter::from_config(&config.admission)?;

    match normalize_url(url) {
        Ok(normalized) => println!("Normalized: {}", normalized),
        Err(e) => println!("Normalized: - ({})", e),
    }

    match filter.check(url) {
        Ok(()) => println!("✓ Admitted: {}", url),
        Err(rejection) => println!("✗ Rejected: {} ({})", url, rejection),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, restart: bool) -> anyhow::Result<()> {
    if restart {
        tracing::info!("Starting fresh crawl (discarding saved frontier)");
    } else {
        tracing::info!("Starting crawl (will resume from saved frontier if present)");
    }

    tracing::info!(
        "Workers: {}, politeness delay: {}s, seeds: {}",
        config.crawler.threads,
        config.crawler.politeness_delay,
        config.crawler.seeds.len()
    );

    let report = crawl(config, config_hash, restart)
        .await
        .context("Crawl failed")?;

    println!("\n{}", report.to_text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_is_default() {
        let cli = Cli::try_parse_from(["polite-frontier", "crawl.toml"]).unwrap();
        assert!(!cli.fresh_start());

        let cli = Cli::try_parse_from(["polite-frontier", "crawl.toml", "--resume"]).unwrap();
        assert!(!cli.fresh_start());
    }

    #[test]
    fn test_restart_flag() {
        let cli = Cli::try_parse_from(["polite-frontier", "crawl.toml", "--restart"]).unwrap();
        assert!(cli.fresh_start());
    }

    #[test]
    fn test_restart_conflicts_with_resume() {
        let result = Cli::try_parse_from(["polite-frontier", "crawl.toml", "--restart", "--resume"]);
        assert!(result.is_err());
    }
}
