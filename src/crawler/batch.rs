//! Batch fan-out
//!
//! Every target of a batch is crawled in its own task; the batch returns
//! once all of them have finished, with one detail line per target in input
//! order.
//!
//! The per-crawl timeout is handed to the crawl as its time limit, so the
//! crawl itself stops and saves what it found. A crawl still running
//! [`SAVE_GRACE`] past its limit is abandoned and reported as timed out.

use crate::crawler::coordinator::{CrawlInput, CrawlWebsite};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a crawl may overrun its time limit while it saves its prospect
pub const SAVE_GRACE: Duration = Duration::from_secs(10);

/// Outcome of one target in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlDetail {
    pub url: String,
    pub reason: String,
    pub error: bool,
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub number_of_success: u64,
    pub number_of_fails: u64,
    pub details: Vec<CrawlDetail>,
}

impl BatchReport {
    fn from_details(details: Vec<CrawlDetail>) -> Self {
        let number_of_fails = details.iter().filter(|d| d.error).count() as u64;
        Self {
            number_of_success: details.len() as u64 - number_of_fails,
            number_of_fails,
            details,
        }
    }
}

/// Crawls every input concurrently
///
/// A failing, panicking or timed-out crawl is recorded as a failure and never
/// affects its siblings.
///
/// # Arguments
///
/// * `crawler` - Crawl implementation shared by all tasks
/// * `inputs` - Targets, possibly with owner names
/// * `timeout` - Optional time limit for each input that has none of its own
pub async fn crawl_batch(
    crawler: Arc<dyn CrawlWebsite>,
    inputs: Vec<CrawlInput>,
    timeout: Option<Duration>,
) -> BatchReport {
    let started = Instant::now();
    let total = inputs.len();
    tracing::info!("Crawling {} websites", total);

    let urls: Vec<String> = inputs.iter().map(|i| i.target_url.clone()).collect();
    let tasks = inputs.into_iter().map(|input| {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawl_one(crawler, input, timeout).await })
    });

    let details = join_all(tasks)
        .await
        .into_iter()
        .zip(urls)
        .map(|(joined, url)| match joined {
            Ok(detail) => detail,
            Err(e) => {
                tracing::error!(url = %url, "Crawl task failed: {}", e);
                CrawlDetail {
                    url,
                    reason: format!("crawl task failed: {}", e),
                    error: true,
                }
            }
        })
        .collect();

    let report = BatchReport::from_details(details);
    tracing::info!(
        success = report.number_of_success,
        fails = report.number_of_fails,
        "Done: {} websites in {:?}",
        total,
        started.elapsed()
    );
    report
}

async fn crawl_one(
    crawler: Arc<dyn CrawlWebsite>,
    mut input: CrawlInput,
    timeout: Option<Duration>,
) -> CrawlDetail {
    let url = input.target_url.clone();
    tracing::info!(url = %url, "Crawling");

    input.time_limit = input.time_limit.or(timeout);
    let result = match input.time_limit {
        Some(limit) => {
            match tokio::time::timeout(limit + SAVE_GRACE, crawler.crawl_website(input)).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("crawl timed out after {}s", limit.as_secs())),
            }
        }
        None => crawler.crawl_website(input).await.map_err(|e| e.to_string()),
    };

    match result {
        Ok(response) => {
            tracing::info!(url = %url, prospect_id = %response.prospect_id, "Website crawled");
            CrawlDetail {
                url,
                reason: String::new(),
                error: false,
            }
        }
        Err(reason) => {
            tracing::warn!(url = %url, "Crawl failed: {}", reason);
            CrawlDetail {
                url,
                reason,
                error: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::coordinator::{CrawlResponse, SocialNetworks};
    use crate::{ProspectorError, Result};
    use async_trait::async_trait;

    /// Succeeds for every URL except a few magic ones
    struct ScriptedCrawler;

    #[async_trait]
    impl CrawlWebsite for ScriptedCrawler {
        async fn crawl_website(&self, input: CrawlInput) -> Result<CrawlResponse> {
            match input.target_url.as_str() {
                "" => Err(ProspectorError::EmptyTargetUrl),
                "https://slow.example" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    unreachable!("crawl should have timed out")
                }
                "https://saving.example" => {
                    // overruns its limit while saving, within the grace period
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(CrawlResponse {
                        prospect_id: "saved".to_string(),
                        emails: Vec::new(),
                        social_networks: SocialNetworks::default(),
                    })
                }
                "https://panic.example" => panic!("boom"),
                url => Ok(CrawlResponse {
                    prospect_id: format!("id-{}", url),
                    emails: Vec::new(),
                    social_networks: SocialNetworks::default(),
                }),
            }
        }
    }

    fn inputs(urls: &[&str]) -> Vec<CrawlInput> {
        urls.iter().map(|u| CrawlInput::new(*u)).collect()
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let report = crawl_batch(
            Arc::new(ScriptedCrawler),
            inputs(&["https://a.example", "https://b.example"]),
            None,
        )
        .await;

        assert_eq!(report.number_of_success, 2);
        assert_eq!(report.number_of_fails, 0);
        assert!(report.details.iter().all(|d| !d.error && d.reason.is_empty()));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_order_kept() {
        let report = crawl_batch(
            Arc::new(ScriptedCrawler),
            inputs(&["https://a.example", "", "https://b.example"]),
            None,
        )
        .await;

        assert_eq!(report.number_of_success, 2);
        assert_eq!(report.number_of_fails, 1);
        let urls: Vec<_> = report.details.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example", "", "https://b.example"]);
        assert!(report.details[1].error);
        assert_eq!(report.details[1].reason, "empty target URL");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure() {
        let report = crawl_batch(
            Arc::new(ScriptedCrawler),
            inputs(&["https://slow.example", "https://a.example"]),
            Some(Duration::from_secs(2)),
        )
        .await;

        assert_eq!(report.number_of_fails, 1);
        assert_eq!(report.details[0].reason, "crawl timed out after 2s");
        assert!(!report.details[1].error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_within_grace_succeeds() {
        let report = crawl_batch(
            Arc::new(ScriptedCrawler),
            inputs(&["https://saving.example"]),
            Some(Duration::from_secs(2)),
        )
        .await;

        assert_eq!(report.number_of_success, 1);
        assert!(report.details[0].reason.is_empty());
    }

    /// Records the time limit each crawl was given
    #[derive(Default)]
    struct RecordingCrawler {
        limits: std::sync::Mutex<Vec<(String, Option<Duration>)>>,
    }

    #[async_trait]
    impl CrawlWebsite for RecordingCrawler {
        async fn crawl_website(&self, input: CrawlInput) -> Result<CrawlResponse> {
            self.limits
                .lock()
                .unwrap()
                .push((input.target_url.clone(), input.time_limit));
            Ok(CrawlResponse {
                prospect_id: input.target_url,
                emails: Vec::new(),
                social_networks: SocialNetworks::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_the_crawl_time_limit() {
        let crawler = Arc::new(RecordingCrawler::default());
        let inputs = vec![
            CrawlInput::new("https://a.example"),
            CrawlInput::new("https://b.example").with_time_limit(Duration::from_secs(7)),
        ];

        crawl_batch(crawler.clone(), inputs, Some(Duration::from_secs(3))).await;

        let mut limits = crawler.limits.lock().unwrap().clone();
        limits.sort();
        assert_eq!(
            limits,
            vec![
                ("https://a.example".to_string(), Some(Duration::from_secs(3))),
                ("https://b.example".to_string(), Some(Duration::from_secs(7))),
            ]
        );
    }

    #[tokio::test]
    async fn test_panic_is_a_failure() {
        let report = crawl_batch(
            Arc::new(ScriptedCrawler),
            inputs(&["https://panic.example"]),
            None,
        )
        .await;

        assert_eq!(report.number_of_fails, 1);
        assert_eq!(report.details[0].url, "https://panic.example");
        assert!(report.details[0].reason.starts_with("crawl task failed"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = crawl_batch(Arc::new(ScriptedCrawler), Vec::new(), None).await;
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = BatchReport::from_details(vec![CrawlDetail {
            url: "https://a.example".to_string(),
            reason: String::new(),
            error: false,
        }]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["numberOfSuccess"], 1);
        assert_eq!(json["details"][0]["url"], "https://a.example");
    }
}
