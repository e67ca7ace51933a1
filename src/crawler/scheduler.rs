//! Scheduler driving one crawl session
//!
//! This module handles:
//! - The work queue seeded with the first GET request
//! - Global concurrency limiting via a semaphore
//! - Graceful-stop and hard-cancel deadlines
//! - Handing every fetched response to a response handler

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch, FetchedResponse, Request};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors returned when enqueueing work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("crawl queue is closed")]
    Closed,
}

/// Handle used by response handlers to enqueue more requests
#[derive(Debug, Clone)]
pub struct QueueHandle {
    tx: UnboundedSender<Request>,
}

impl QueueHandle {
    pub fn from_sender(tx: UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    pub fn send(&self, request: Request) -> Result<(), QueueError> {
        self.tx.send(request).map_err(|_| QueueError::Closed)
    }

    pub fn send_get(&self, url: impl Into<String>) -> Result<(), QueueError> {
        self.send(Request::get(url))
    }

    pub fn send_head(&self, url: impl Into<String>) -> Result<(), QueueError> {
        self.send(Request::head(url))
    }
}

/// Receives every response fetched during a crawl
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn handle(&self, response: FetchedResponse, queue: &QueueHandle);
}

/// Wall-clock limit applied to a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Run until the queue drains
    Unbounded,
    /// After the duration, refuse new requests but finish queued ones
    GracefulStop(Duration),
    /// After the duration, abort in-flight fetches and return
    HardCancel(Duration),
}

impl Termination {
    /// Picks the policy from the crawler settings
    ///
    /// A non-zero `cancel-after` always wins over `stop-after`, so with the
    /// default configuration every crawl is hard-cancelled after its TTL.
    pub fn from_config(config: &CrawlerConfig) -> Self {
        if config.cancel_after_seconds > 0 {
            Self::HardCancel(config.cancel_after())
        } else if config.stop_after_seconds > 0 {
            Self::GracefulStop(config.stop_after())
        } else {
            Self::Unbounded
        }
    }

    fn after(&self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::GracefulStop(after) | Self::HardCancel(after) => Some(*after),
        }
    }
}

/// How a crawl session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlEnd {
    /// Queue drained before any deadline
    Drained,
    /// Graceful stop fired, then the remaining work drained
    Stopped,
    /// Hard cancel fired or the caller cancelled
    Cancelled,
}

/// Counters reported at the end of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    /// Responses handed to the handler (errors included)
    pub fetched: usize,
    /// Responses that were fetch errors
    pub failed: usize,
    pub end: CrawlEnd,
}

/// Drives fetches for one crawl session
pub struct Scheduler {
    client: Client,
    semaphore: Arc<Semaphore>,
    termination: Termination,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client shared by all fetch tasks
    /// * `config` - Concurrency limit and termination deadlines
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1) as usize)),
            termination: Termination::from_config(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the termination policy
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Lets the caller abort the session through a token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Crawls from a seed request until the queue drains or a deadline fires
    ///
    /// Per-URL failures are passed to the handler and never end the session.
    /// A seed that cannot be enqueued is logged and the session ends at once.
    pub async fn run(&self, seed: Request, handler: Arc<dyn ResponseHandler>) -> CrawlStats {
        let (tx, mut rx) = unbounded_channel();
        let queue = QueueHandle { tx };
        let counters = Arc::new(Counters::default());

        if let Err(e) = queue.send(seed.clone()) {
            tracing::warn!(url = %seed.url, "Failed to enqueue seed: {}", e);
            return counters.snapshot(CrawlEnd::Drained);
        }

        let deadline = self.termination.after().map(|after| Instant::now() + after);
        let timer = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timer);

        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut timer_fired = false;
        let mut end = CrawlEnd::Drained;

        loop {
            if tasks.is_empty() {
                // Nothing in flight: whatever is still queued is all that is left
                match rx.try_recv() {
                    Ok(request) => {
                        self.spawn_fetch(&mut tasks, request, &queue, &handler, &counters);
                        continue;
                    }
                    Err(_) => break,
                }
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::info!("Crawl cancelled by caller, aborting {} tasks", tasks.len());
                    tasks.abort_all();
                    end = CrawlEnd::Cancelled;
                    break;
                }

                _ = &mut timer, if !timer_fired => {
                    timer_fired = true;
                    match self.termination {
                        Termination::HardCancel(after) => {
                            tracing::info!(
                                "Crawl TTL of {}s reached, aborting {} tasks",
                                after.as_secs(),
                                tasks.len()
                            );
                            tasks.abort_all();
                            end = CrawlEnd::Cancelled;
                            break;
                        }
                        Termination::GracefulStop(after) => {
                            tracing::info!(
                                "Crawl stop after {}s reached, closing the queue",
                                after.as_secs()
                            );
                            rx.close();
                            end = CrawlEnd::Stopped;
                        }
                        Termination::Unbounded => {}
                    }
                }

                Some(joined) = tasks.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("Fetch task panicked: {}", e);
                        }
                    }
                }

                Some(request) = rx.recv() => {
                    self.spawn_fetch(&mut tasks, request, &queue, &handler, &counters);
                }
            }
        }

        drain_closed(&mut rx);
        let stats = counters.snapshot(end);
        tracing::debug!(
            "Crawl session ended ({:?}): {} responses, {} failed",
            stats.end,
            stats.fetched,
            stats.failed
        );
        stats
    }

    fn spawn_fetch(
        &self,
        tasks: &mut JoinSet<()>,
        request: Request,
        queue: &QueueHandle,
        handler: &Arc<dyn ResponseHandler>,
        counters: &Arc<Counters>,
    ) {
        let client = self.client.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let queue = queue.clone();
        let handler = Arc::clone(handler);
        let counters = Arc::clone(counters);

        tasks.spawn(async move {
            let response = {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                fetch(&client, &request).await
            };

            counters.fetched.fetch_add(1, Ordering::Relaxed);
            if matches!(response, FetchedResponse::Error { .. }) {
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }

            handler.handle(response, &queue).await;
        });
    }
}

#[derive(Debug, Default)]
struct Counters {
    fetched: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn snapshot(&self, end: CrawlEnd) -> CrawlStats {
        CrawlStats {
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            end,
        }
    }
}

/// Drops requests still queued when the session ends
fn drain_closed(rx: &mut UnboundedReceiver<Request>) {
    rx.close();
    let mut dropped = 0;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::debug!("Dropped {} queued requests at end of crawl", dropped);
    }
}
