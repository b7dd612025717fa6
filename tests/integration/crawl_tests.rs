//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use polite_frontier::config::{
    AdmissionConfig, Config, CrawlerConfig, ReportConfig, StorageConfig, UserAgentConfig,
};
use polite_frontier::crawler::{crawl, Checkout, Coordinator, Frontier, FrontierOptions};
use polite_frontier::output::{NoopObserver, PageAnalytics};
use polite_frontier::storage::{SqliteStore, UrlStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling only the mock server's host
fn create_test_config(seeds: Vec<String>, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            threads: 3,
            politeness_delay: 0.05, // Very short for testing
            poll_interval_ms: 10,
            request_timeout: 5,
            seeds,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            save_file: dir.join("frontier.db").to_string_lossy().into_owned(),
        },
        admission: AdmissionConfig {
            allowed_domains: vec!["127.0.0.1".to_string()],
            ..AdmissionConfig::default()
        },
        report: ReportConfig {
            json_path: dir.join("report.json").to_string_lossy().into_owned(),
            text_path: dir.join("report.txt").to_string_lossy().into_owned(),
            subdomain_root: "127.0.0.1".to_string(),
            min_page_tokens: 1,
            ..ReportConfig::default()
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(format!("<html><body>{}</body></html>", body), "text/html")
}

async fn mount_page(server: &MockServer, at: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<main><p>Welcome to the research group homepage</p>
               <a href="/people">People</a>
               <a href="{base}/projects#current">Projects</a>
               <a href="/events/2023-05/">May events</a>
               <a href="/a/b/a/b/">Loop</a>
               <a href="/paper.pdf">Paper</a>
               <a href="/?replytocom=12">Reply</a>
               <a href="https://www.google.com/">Elsewhere</a>
               <a href="mailto:lab@example.com">Mail</a></main>"#
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/people",
        r#"<p>Graduate students and faculty</p><a href="/">Home</a><a href="/projects">Projects</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/projects", "<p>Distributed systems research</p>", 1).await;

    // Trap URLs must never be requested
    for trap in ["/events/2023-05/", "/events/2023-05", "/a/b/a/b", "/paper.pdf"] {
        Mock::given(method("GET"))
            .and(path(trap))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }

    let config = create_test_config(vec![format!("{}/", base)], dir.path());
    let report = crawl(&config, "test-hash", true).await.unwrap();

    assert_eq!(report.unique_pages_count, 3);
    assert_eq!(report.subdomains.get("127.0.0.1"), Some(&3));
    assert!(report.top_words.iter().any(|w| w.word == "research"));

    let json = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    assert!(json.contains("\"unique_pages_count\": 3"));
    assert!(dir.path().join("report.txt").exists());

    let store = SqliteStore::open(&dir.path().join("frontier.db")).unwrap();
    let counts = store.counts().unwrap();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.completed, 3);
}

#[tokio::test]
async fn test_failed_pages_are_completed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/broken">Broken</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{}/", base)], dir.path());
    let mut coordinator =
        Coordinator::new(&config, "test-hash", true, Arc::new(NoopObserver)).unwrap();
    let summaries = coordinator.run().await.unwrap();

    assert_eq!(summaries.iter().map(|s| s.pages).sum::<usize>(), 3);
    assert_eq!(summaries.iter().map(|s| s.failures).sum::<usize>(), 2);
    assert_eq!(coordinator.frontier().completed_count(), 3);
    assert_eq!(coordinator.frontier().active_downloads(), 0);
}

#[tokio::test]
async fn test_resume_skips_completed_urls() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/", base)], dir.path());

    // A previous run completed the home page and was interrupted before /next
    {
        let store = SqliteStore::open(Path::new(&config.storage.save_file)).unwrap();
        let frontier = Frontier::open(
            Box::new(store),
            FrontierOptions::from_config(&config.crawler, true),
            &config.crawler.seeds,
            None,
        )
        .unwrap();
        let home = match frontier.try_next() {
            Checkout::Ready(url) => url,
            other => panic!("expected the seed, got {:?}", other),
        };
        frontier.enqueue(&format!("{}/next", base)).unwrap();
        frontier.complete(&home).unwrap();
    }

    mount_page(&server, "/", "<p>home</p>", 0).await;
    mount_page(&server, "/next", "<p>next page text</p>", 1).await;

    let analytics = Arc::new(PageAnalytics::new(&config.report));
    let mut coordinator =
        Coordinator::new(&config, "test-hash", false, analytics.clone()).unwrap();
    assert_eq!(coordinator.frontier().pending_count(), 1);
    assert_eq!(coordinator.frontier().completed_count(), 1);

    coordinator.run().await.unwrap();

    assert_eq!(analytics.unique_pages(), 1);
    assert_eq!(coordinator.frontier().completed_count(), 2);
}

#[tokio::test]
async fn test_restart_reseeds() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/", base)], dir.path());

    mount_page(&server, "/", "<p>home</p>", 2).await;

    // Second resume has nothing left to do; restart fetches the seed again
    crawl(&config, "test-hash", true).await.unwrap();
    let resumed = crawl(&config, "test-hash", false).await.unwrap();
    assert_eq!(resumed.unique_pages_count, 0);
    let restarted = crawl(&config, "test-hash", true).await.unwrap();
    assert_eq!(restarted.unique_pages_count, 1);
}
