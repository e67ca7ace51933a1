//! Integration tests for the crawler
//!
//! These tests use wiremock to serve small websites, a scripted mailbox
//! prober instead of real SMTP, and an in-memory SQLite store to exercise the
//! full crawl cycle end-to-end.

use async_trait::async_trait;
use prospector::config::{
    BatchConfig, Config, CrawlerConfig, MailConfig, OutputConfig, UserAgentConfig,
};
use prospector::crawler::{
    crawl_batch, similarity, CrawlInput, CrawlWebsite, Crawler, SharedStorage,
};
use prospector::email::{MailboxProber, ProbeError};
use prospector::prospect::{Prospect, SocialPlatform};
use prospector::storage::{SqliteStorage, Storage};
use prospector::ProspectorError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Accepts a fixed set of addresses and records every probe
struct FakeProber {
    accept_all: bool,
    reachable: HashSet<String>,
    delay: Duration,
    probed: Mutex<Vec<String>>,
}

impl FakeProber {
    fn accepting(addresses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            accept_all: false,
            reachable: addresses.iter().map(|a| a.to_string()).collect(),
            delay: Duration::ZERO,
            probed: Mutex::new(Vec::new()),
        })
    }

    fn catch_all() -> Arc<Self> {
        Arc::new(Self {
            accept_all: true,
            reachable: HashSet::new(),
            delay: Duration::ZERO,
            probed: Mutex::new(Vec::new()),
        })
    }

    /// Rejects everything, taking `delay` per address like a slow mail server
    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            accept_all: false,
            reachable: HashSet::new(),
            delay,
            probed: Mutex::new(Vec::new()),
        })
    }

    fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailboxProber for FakeProber {
    async fn probe(&self, address: &str) -> Result<bool, ProbeError> {
        self.probed.lock().unwrap().push(address.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.accept_all || self.reachable.contains(address))
    }
}

/// Creates a test configuration with the given hard-cancel TTL
fn create_test_config(cancel_after_seconds: u64) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_fetches: 4,
            stop_after_seconds: 15,
            cancel_after_seconds,
            request_timeout_seconds: 30,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        mail: MailConfig::default(),
        batch: BatchConfig::default(),
        output: OutputConfig {
            database_path: ":memory:".to_string(),
            lock_path: "./test.lock".to_string(),
        },
    }
}

fn create_crawler(
    prober: Arc<FakeProber>,
    cancel_after_seconds: u64,
) -> (Crawler, Arc<Mutex<SqliteStorage>>) {
    let storage = Arc::new(Mutex::new(
        SqliteStorage::new_in_memory().expect("Failed to open in-memory storage"),
    ));
    let shared: SharedStorage = storage.clone();
    let crawler = Crawler::new(create_test_config(cancel_after_seconds), shared, prober)
        .expect("Failed to create crawler");
    (crawler, storage)
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_collects_signals() {
    let server = MockServer::start().await;
    let seed = server.uri();
    let host = url::Url::parse(&seed).unwrap().host_str().unwrap().to_string();

    mount_page(
        &server,
        "/",
        r#"<html><head>
            <link rel="icon" href="/favicon.ico">
            <link rel="stylesheet" href="/style.css">
            <meta name="keywords" content="shoes, leather">
            <meta name="description" content="Handmade shoes">
        </head><body>
            <p>Hello, I'm Jane Doe and I make shoes.</p>
            <a href="mailto:info@example.com?subject=Hi">Mail us</a>
            <a href="https://twitter.com/janedoeshoes">Twitter</a>
            <a href="https://twitter.com/share?url=x">Share</a>
            <a href="/about">About</a>
            <a href="/about/team">Team</a>
            <a href="https://other.example/page">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        r#"<html><body>Write to hello@example.org for orders.
            <a href="/">Home</a></body></html>"#,
    )
    .await;

    // Links deeper than one path segment are never followed
    Mock::given(method("GET"))
        .and(path("/about/team"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let prober = FakeProber::accepting(&["info@example.com", "hello@example.org"]);
    let (crawler, storage) = create_crawler(prober.clone(), 15);

    let response = crawler
        .crawl_website(CrawlInput::new(seed.clone()))
        .await
        .expect("Crawl failed");

    assert_eq!(response.emails.len(), 2);
    assert!(response.emails.contains(&"info@example.com".to_string()));
    assert!(response.emails.contains(&"hello@example.org".to_string()));
    assert_eq!(
        response.social_networks.twitter,
        vec!["https://twitter.com/janedoeshoes"]
    );

    let storage = storage.lock().unwrap();
    let id = response.prospect_id.as_str();

    let stored = storage.get_prospect(id).unwrap();
    assert_eq!(stored.url, seed);
    assert_eq!(stored.first_name, "jane");
    assert_eq!(stored.last_name, "doe");

    let emails = storage.get_emails(id).unwrap();
    assert!(emails.iter().all(|e| e.confidence == 1.0 && !e.validated_by_user));

    let social = storage.get_social_media(id).unwrap();
    assert_eq!(social.len(), 1);
    assert_eq!(social[0].platform, SocialPlatform::Twitter);
    let brand = Prospect::new(&seed).domain_name_without_extension();
    assert!((social[0].confidence - similarity("janedoeshoes", &brand)).abs() < 1e-9);

    assert_eq!(
        storage.get_assets(id).unwrap().icons,
        vec![format!("{}/favicon.ico", seed)]
    );
    assert_eq!(storage.get_tags(id).unwrap(), vec!["shoes", "leather"]);
    assert_eq!(
        storage.get_description(id).unwrap().as_deref(),
        Some("Handmade shoes")
    );

    // The owner's name found on the page drives mailbox guessing
    let probed = prober.probed();
    assert!(probed.contains(&format!("all_policy_activated@{}", host)));
    assert!(probed.contains(&format!("jane.doe@{}", host)));
    assert!(probed.contains(&format!("contact@{}", host)));
}

#[tokio::test]
async fn test_guessed_email_is_saved_with_half_confidence() {
    let server = MockServer::start().await;
    let seed = server.uri();
    let host = url::Url::parse(&seed).unwrap().host_str().unwrap().to_string();
    mount_page(&server, "/", "<html><body>Welcome</body></html>").await;

    let guessed = format!("jdoe@{}", host);
    let prober = FakeProber::accepting(&[guessed.as_str()]);
    let (crawler, storage) = create_crawler(prober.clone(), 15);

    let response = crawler
        .crawl_website(CrawlInput::new(seed).with_names("John", "", "Doe"))
        .await
        .expect("Crawl failed");

    assert_eq!(response.emails, vec![guessed.clone()]);
    let emails = storage.lock().unwrap().get_emails(&response.prospect_id).unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].email, guessed);
    assert_eq!(emails[0].confidence, 0.5);

    // Single-character local parts are never probed
    assert!(!prober.probed().contains(&format!("j@{}", host)));
}

#[tokio::test]
async fn test_catch_all_domain_skips_guessing() {
    let server = MockServer::start().await;
    let seed = server.uri();
    let host = url::Url::parse(&seed).unwrap().host_str().unwrap().to_string();
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="mailto:info@example.com">Mail</a></body></html>"#,
    )
    .await;

    let prober = FakeProber::catch_all();
    let (crawler, storage) = create_crawler(prober.clone(), 15);

    let response = crawler
        .crawl_website(CrawlInput::new(seed).with_names("Jane", "", "Doe"))
        .await
        .expect("Crawl failed");

    assert_eq!(response.emails, vec!["info@example.com"]);
    let emails = storage.lock().unwrap().get_emails(&response.prospect_id).unwrap();
    assert!(emails.iter().all(|e| e.confidence == 1.0));

    let probed = prober.probed();
    assert_eq!(
        probed,
        vec![
            "info@example.com".to_string(),
            format!("all_policy_activated@{}", host)
        ]
    );
}

#[tokio::test]
async fn test_hard_cancel_keeps_partial_results() {
    let server = MockServer::start().await;
    let seed = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="mailto:info@example.com">Mail</a>
            <a href="/slow">Slow page</a>
        </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>late@example.com</body></html>", "text/html")
                .set_delay(Duration::from_secs(20)),
        )
        .mount(&server)
        .await;

    let prober = FakeProber::accepting(&["info@example.com", "late@example.com"]);
    let (crawler, storage) = create_crawler(prober, 1);

    let started = Instant::now();
    let response = crawler
        .crawl_website(CrawlInput::new(seed))
        .await
        .expect("Crawl failed");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(response.emails, vec!["info@example.com"]);
    let stored = storage.lock().unwrap().get_emails(&response.prospect_id).unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_the_crawl() {
    let server = MockServer::start().await;
    let seed = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/missing">Gone</a>
            <a href="/contact">Contact</a>
        </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/contact",
        r#"<html><body><a href="mailto:sales@example.com">Sales</a></body></html>"#,
    )
    .await;

    let prober = FakeProber::accepting(&["sales@example.com"]);
    let (crawler, _storage) = create_crawler(prober, 15);

    let response = crawler
        .crawl_website(CrawlInput::new(seed))
        .await
        .expect("Crawl failed");
    assert_eq!(response.emails, vec!["sales@example.com"]);
}

#[tokio::test]
async fn test_recrawl_reuses_prospect() {
    let server = MockServer::start().await;
    let seed = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="mailto:info@example.com">Mail</a></body></html>"#,
    )
    .await;

    let prober = FakeProber::accepting(&["info@example.com"]);
    let (crawler, storage) = create_crawler(prober, 15);

    let first = crawler
        .crawl_website(CrawlInput::new(seed.clone()))
        .await
        .unwrap();
    let second = crawler.crawl_website(CrawlInput::new(seed)).await.unwrap();

    assert_eq!(first.prospect_id, second.prospect_id);
    let storage = storage.lock().unwrap();
    assert_eq!(storage.list_prospects().unwrap().len(), 1);
    assert_eq!(storage.get_emails(&first.prospect_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_targets_are_rejected() {
    let (crawler, storage) = create_crawler(FakeProber::accepting(&[]), 15);

    let empty = crawler.crawl_website(CrawlInput::new("")).await;
    assert!(matches!(empty, Err(ProspectorError::EmptyTargetUrl)));

    let invalid = crawler.crawl_website(CrawlInput::new("example dot com")).await;
    assert!(matches!(
        invalid,
        Err(ProspectorError::InvalidTargetUrl { .. })
    ));

    assert!(storage.lock().unwrap().list_prospects().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_crawl_reports_each_target() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_page(&first, "/", "<html><body>One</body></html>").await;
    mount_page(&second, "/", "<html><body>Two</body></html>").await;

    let (crawler, storage) = create_crawler(FakeProber::accepting(&[]), 15);
    let crawler: Arc<dyn CrawlWebsite> = Arc::new(crawler);

    let report = crawl_batch(
        crawler,
        vec![
            CrawlInput::new(first.uri()),
            CrawlInput::new(""),
            CrawlInput::new(second.uri()),
        ],
        Some(Duration::from_secs(60)),
    )
    .await;

    assert_eq!(report.number_of_success, 2);
    assert_eq!(report.number_of_fails, 1);
    assert_eq!(report.details[0].url, first.uri());
    assert!(report.details[1].error);
    assert_eq!(report.details[1].reason, "empty target URL");
    assert_eq!(report.details[2].url, second.uri());
    assert_eq!(storage.lock().unwrap().list_prospects().unwrap().len(), 2);
}

#[tokio::test]
async fn test_each_url_is_fetched_once() {
    let server = MockServer::start().await;
    let seed = server.uri();

    let pages = [
        (
            "/",
            r#"<a href="/">Home</a><a href="/a">A</a><a href="/a#frag">A again</a>
               <a href="/b/">B</a><a href="/A">Upper A</a>"#,
        ),
        (
            "/a",
            r#"<a href="/">Home</a><a href="/b/">B</a><a href="/a#frag">Self</a>
               <a href="/A">Upper A</a>"#,
        ),
        (
            "/b/",
            r#"<a href="/">Home</a><a href="/a">A</a><a href="/b">B</a>"#,
        ),
        ("/A", r#"<a href="/a">A</a><a href="/b/">B</a><a href="/">Home</a>"#),
    ];
    for (route, links) in pages {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!("<html><body>{}</body></html>", links),
                "text/html",
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    let (crawler, _storage) = create_crawler(FakeProber::accepting(&[]), 15);
    crawler.crawl_website(CrawlInput::new(seed)).await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn test_slow_mail_server_keeps_crawled_signals() {
    let server = MockServer::start().await;
    let seed = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><head><meta name="description" content="Handmade shoes"></head>
        <body>
            <p>Hi, I'm Jane Doe.</p>
            <a href="https://twitter.com/janedoe">Twitter</a>
        </body></html>"#,
    )
    .await;

    let prober = FakeProber::slow(Duration::from_millis(100));
    let (crawler, storage) = create_crawler(prober.clone(), 15);
    let crawler: Arc<dyn CrawlWebsite> = Arc::new(crawler);

    let started = Instant::now();
    let report = crawl_batch(
        crawler,
        vec![CrawlInput::new(seed.clone())],
        Some(Duration::from_secs(3)),
    )
    .await;

    assert_eq!(report.number_of_success, 1, "{:?}", report);
    assert!(started.elapsed() < Duration::from_secs(10));
    // probing stopped at the time limit, well short of every candidate
    let probed = prober.probed();
    assert!(probed.len() < 40, "probed {} addresses", probed.len());
    assert!(probed.iter().any(|a| a.starts_with("jane")));

    let storage = storage.lock().unwrap();
    let prospects = storage.list_prospects().unwrap();
    assert_eq!(prospects.len(), 1);
    let id = &prospects[0].id;
    assert_eq!(prospects[0].first_name, "jane");
    assert_eq!(
        storage.get_description(id).unwrap().as_deref(),
        Some("Handmade shoes")
    );
    let social = storage.get_social_media(id).unwrap();
    assert_eq!(social[0].platform, SocialPlatform::Twitter);
    assert_eq!(social[0].url, "https://twitter.com/janedoe");
}
