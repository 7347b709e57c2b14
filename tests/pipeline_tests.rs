//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to stand up mock HTTP servers and exercise the
//! full pipeline end-to-end: seeding, politeness, redirects, extraction,
//! frontier expansion, retries, and the drain protocol.

use anyhow::Context;
use disclosure_crawler::config::{Config, HttpConfig, OutputConfig, PipelineConfig};
use disclosure_crawler::extract::Extractor;
use disclosure_crawler::pipeline::{
    Coordinator, Metadata, Payload, ScrapeOutcome, ScrapeTask, SeedRequest,
};
use reqwest::{Client, Method};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into the given scratch directory
fn test_config(dir: &Path, max_retries: u32) -> Config {
    Config {
        pipeline: PipelineConfig {
            producers: 2,
            request_workers: 4,
            response_writers: 2,
            idle_sleep_ms: 1,
            max_retries,
        },
        http: HttpConfig {
            timeout_secs: 5,
            connect_timeout_secs: 5,
            user_agent: "TestBot/1.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        },
        output: OutputConfig {
            dataset_path: dir.join("data.jsonl").to_string_lossy().into_owned(),
            error_log_path: dir.join("error.jsonl").to_string_lossy().into_owned(),
        },
        seed: vec![],
    }
}

/// Extractor that terminates the crawl at this task
fn terminal_extractor() -> Arc<dyn Extractor> {
    Arc::new(|task: &ScrapeTask, _client: &Client| -> anyhow::Result<ScrapeOutcome> {
        Ok(ScrapeOutcome::terminal(task.metadata().clone()))
    })
}

/// Seed metadata carrying the firm identity the dataset record needs
fn report_seed(method: Method, url: &str, extractor: Arc<dyn Extractor>) -> SeedRequest {
    let mut seed = SeedRequest::new(method, url, extractor);
    seed.metadata.set_share("Acme Plc", "ACM");
    seed.metadata.set("document_type", "annual_report");
    seed.metadata.set("year", 2023);
    seed
}

async fn mount_robots(server: &MockServer, body: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn page_requests(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .filter(|r| r.url.path() != "/robots.txt")
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_redirect_extraction_and_follow_up_scenario() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "", 404).await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/real"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_string("detail body"))
        .mount(&server)
        .await;

    // The hub extractor forwards the body and discovers one detail page,
    // which terminates without a payload
    let detail_extractor = terminal_extractor();
    let hub_extractor: Arc<dyn Extractor> = {
        let base = base.clone();
        Arc::new(move |task: &ScrapeTask, client: &Client| -> anyhow::Result<ScrapeOutcome> {
            let response = task.response().context("task not sent")?;
            let detail_url = format!("{}/detail", base);
            let follow_up = ScrapeTask::new(
                client.clone(),
                Method::GET,
                Url::parse(&detail_url)?,
                Metadata::new("GET", &detail_url),
                detail_extractor.clone(),
            );
            Ok(ScrapeOutcome::new(
                task.metadata().clone(),
                Some(Payload::Text(response.text().into_owned())),
                Some(vec![follow_up]),
            ))
        })
    };

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), 3);
    let coordinator = Coordinator::new(config).expect("failed to build coordinator");
    let seeds = vec![report_seed(
        Method::GET,
        &format!("{}/list", base),
        hub_extractor,
    )];

    coordinator.run(seeds).await.expect("pipeline failed");

    // Exactly three fetches: the redirected listing, its target, the detail
    let mut paths = page_requests(&server).await;
    paths.sort();
    assert_eq!(paths, vec!["/detail", "/list", "/real"]);

    // Exactly one payload-bearing record, from /real
    let data = std::fs::read_to_string(dir.path().join("data.jsonl")).unwrap();
    let lines: Vec<&str> = data.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["title"], "Acme Plc");
    assert_eq!(record["ticker"], "ACM");
    assert_eq!(record["year"], 2023);
    assert_eq!(record["document_type"], "annual_report");
    assert_eq!(record["doc"], "hello");

    // Drain completeness: nothing pending in either queue at shutdown
    assert_eq!(coordinator.task_queue().pending(), 0);
    assert_eq!(coordinator.response_queue().pending(), 0);

    // No postmortems along the happy path
    let errors = std::fs::read_to_string(dir.path().join("error.jsonl")).unwrap();
    assert!(errors.is_empty());
}

#[tokio::test]
async fn test_retry_budget_bounds_attempts() {
    let server = MockServer::start().await;
    mount_robots(&server, "", 404).await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), 3);
    let coordinator = Coordinator::new(config).unwrap();
    let seeds = vec![report_seed(
        Method::GET,
        &format!("{}/flaky", server.uri()),
        terminal_extractor(),
    )];

    coordinator.run(seeds).await.unwrap();

    // Exactly max-retries total attempts, one postmortem each
    assert_eq!(page_requests(&server).await.len(), 3);
    let errors = std::fs::read_to_string(dir.path().join("error.jsonl")).unwrap();
    assert_eq!(errors.lines().count(), 3);

    // Reset counts recorded at failure time: 0, then 1, then 2
    let resets: Vec<u64> = errors
        .lines()
        .map(|line| {
            serde_json::from_str::<serde_json::Value>(line).unwrap()["resets"]
                .as_u64()
                .unwrap()
        })
        .collect();
    assert_eq!(resets, vec![0, 1, 2]);

    // Nothing was persisted and the frontier drained
    let data = std::fs::read_to_string(dir.path().join("data.jsonl")).unwrap();
    assert!(data.is_empty());
    assert_eq!(coordinator.task_queue().pending(), 0);
}

#[tokio::test]
async fn test_extraction_error_is_retried_with_fresh_fetch() {
    let server = MockServer::start().await;
    mount_robots(&server, "", 404).await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let failing_extractor: Arc<dyn Extractor> = Arc::new(|_task: &ScrapeTask, _client: &Client| -> anyhow::Result<ScrapeOutcome> {
        anyhow::bail!("markup did not match any known layout")
    });

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), 2);
    let coordinator = Coordinator::new(config).unwrap();
    let seeds = vec![report_seed(
        Method::GET,
        &format!("{}/page", server.uri()),
        failing_extractor,
    )];

    coordinator.run(seeds).await.unwrap();

    // Each extraction retry re-runs against a fresh fetch
    assert_eq!(page_requests(&server).await.len(), 2);
    let errors = std::fs::read_to_string(dir.path().join("error.jsonl")).unwrap();
    assert_eq!(errors.lines().count(), 2);
    let first: serde_json::Value = serde_json::from_str(errors.lines().next().unwrap()).unwrap();
    // The fetch itself succeeded, so the postmortem carries its status
    assert_eq!(first["response"], 200);
}

#[tokio::test]
async fn test_frontier_expansion_fetches_every_discovered_task() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "", 404).await;
    Mock::given(method("GET"))
        .and(path("/hub"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hub"))
        .mount(&server)
        .await;
    for leaf in ["/d1", "/d2", "/d3"] {
        Mock::given(method("GET"))
            .and(path(leaf))
            .respond_with(ResponseTemplate::new(200).set_body_string("leaf"))
            .mount(&server)
            .await;
    }

    let leaf_extractor = terminal_extractor();
    let hub_extractor: Arc<dyn Extractor> = {
        let base = base.clone();
        Arc::new(move |task: &ScrapeTask, client: &Client| -> anyhow::Result<ScrapeOutcome> {
            let follow_ups = ["/d1", "/d2", "/d3"]
                .iter()
                .map(|leaf| {
                    let url = format!("{}{}", base, leaf);
                    Ok(ScrapeTask::new(
                        client.clone(),
                        Method::GET,
                        Url::parse(&url)?,
                        Metadata::new("GET", &url),
                        leaf_extractor.clone(),
                    ))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(ScrapeOutcome::new(task.metadata().clone(), None, Some(follow_ups)))
        })
    };

    let dir = tempfile::tempdir().unwrap();
    let coordinator = Coordinator::new(test_config(dir.path(), 3)).unwrap();
    let seeds = vec![report_seed(
        Method::GET,
        &format!("{}/hub", base),
        hub_extractor,
    )];

    coordinator.run(seeds).await.unwrap();

    let mut paths = page_requests(&server).await;
    paths.sort();
    assert_eq!(paths, vec!["/d1", "/d2", "/d3", "/hub"]);
    assert_eq!(coordinator.task_queue().pending(), 0);
    assert_eq!(coordinator.response_queue().pending(), 0);
}

#[tokio::test]
async fn test_crawl_delay_spaces_same_host_requests() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nCrawl-delay: 0.5", 200).await;
    for page in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let coordinator = Coordinator::new(test_config(dir.path(), 3)).unwrap();
    let seeds = vec![
        report_seed(
            Method::GET,
            &format!("{}/a", server.uri()),
            terminal_extractor(),
        ),
        report_seed(
            Method::GET,
            &format!("{}/b", server.uri()),
            terminal_extractor(),
        ),
    ];

    let started = Instant::now();
    coordinator.run(seeds).await.unwrap();

    // Two requests to one host with a 0.5s crawl delay leave one full gap
    assert!(
        started.elapsed() >= Duration::from_millis(500),
        "same-host requests were not spaced by the crawl delay"
    );
    assert_eq!(page_requests(&server).await.len(), 2);
}

#[tokio::test]
async fn test_unresolvable_robots_allows_back_to_back_requests() {
    let server = MockServer::start().await;
    // No robots mock at all: wiremock answers 404, the delay defaults to zero
    for page in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let coordinator = Coordinator::new(test_config(dir.path(), 3)).unwrap();
    let seeds = ["/a", "/b", "/c"]
        .iter()
        .map(|page| {
            report_seed(
                Method::GET,
                &format!("{}{}", server.uri(), page),
                terminal_extractor(),
            )
        })
        .collect();

    let started = Instant::now();
    coordinator.run(seeds).await.unwrap();

    assert_eq!(page_requests(&server).await.len(), 3);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "zero-delay host should not be throttled"
    );
}
