//! Crawl session state
//!
//! A session scopes one prospect and one visited-URL set to a single
//! `crawl_website` call and routes every fetched response.

use crate::crawler::extractor::PageExtractor;
use crate::crawler::fetcher::{FetchedResponse, Request};
use crate::crawler::router::{RouteAction, Router};
use crate::crawler::scheduler::{QueueHandle, ResponseHandler};
use crate::email::MailboxProber;
use crate::prospect::Prospect;
use crate::url::normalize_url;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// Set of normalized URLs already enqueued in a session
///
/// Check and mark happen under one lock, so two concurrent pages linking to
/// the same URL enqueue it once.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL visited, returning true if it was not visited before
    pub fn insert(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One crawl of one seed URL
pub struct CrawlSession {
    seed: Url,
    prospect: Arc<Mutex<Prospect>>,
    visited: Arc<VisitedSet>,
    router: Router,
    extractor: PageExtractor,
}

impl CrawlSession {
    /// Creates a session; the seed is marked visited up front
    pub fn new(seed: Url, prospect: Prospect, prober: Arc<dyn MailboxProber>) -> Self {
        let prospect = Arc::new(Mutex::new(prospect));
        let visited = Arc::new(VisitedSet::new());
        match normalize_url(seed.as_str()) {
            Ok(normalized) => {
                visited.insert(normalized.as_str());
            }
            Err(e) => tracing::debug!(url = %seed, "Seed not normalizable: {}", e),
        }

        let extractor = PageExtractor::new(
            Arc::clone(&prospect),
            Arc::clone(&visited),
            seed.clone(),
            prober,
        );

        Self {
            router: Router::for_seed(&seed),
            seed,
            prospect,
            visited,
            extractor,
        }
    }

    /// First request of the session
    pub fn seed_request(&self) -> Request {
        Request::get(self.seed.as_str())
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Snapshot of the prospect as built so far
    pub fn prospect(&self) -> Prospect {
        self.prospect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ResponseHandler for CrawlSession {
    async fn handle(&self, response: FetchedResponse, queue: &QueueHandle) {
        match self.router.route(&response) {
            Some(RouteAction::LogError) => {
                if let FetchedResponse::Error { request, error } = &response {
                    tracing::warn!(method = %request.method, url = %request.url, "Fetch failed: {}", error);
                }
            }
            Some(RouteAction::ExtractPage) => {
                if let FetchedResponse::Get {
                    url,
                    body: Some(body),
                    ..
                } = &response
                {
                    self.extractor.extract(url, body, queue).await;
                }
            }
            Some(RouteAction::ReissueAsGet) => {
                if let Err(e) = queue.send_get(response.url()) {
                    tracing::warn!(url = %response.url(), "Failed to re-issue as GET: {}", e);
                }
            }
            None => {
                tracing::debug!(
                    url = %response.url(),
                    content_type = response.content_type().unwrap_or(""),
                    "Dropping unrouted response"
                );
            }
        }
    }
}
