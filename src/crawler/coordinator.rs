//! Crawler coordinator - one prospect crawl from seed to database
//!
//! `Crawler::crawl` validates the target, runs a crawl session through the
//! scheduler, guesses the owner's mailbox once the site is exhausted and
//! persists the prospect with every signal gathered along the way.

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::scheduler::{CrawlEnd, ResponseHandler, Scheduler};
use crate::crawler::session::CrawlSession;
use crate::email::{DiscoveryOutcome, EmailDiscovery, MailboxProber, SmtpProber};
use crate::prospect::{Prospect, SignalKind, SocialPlatform};
use crate::storage::{SqliteStorage, Storage};
use crate::{ProspectorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Confidence given to guessed addresses the mail server accepted
pub const GUESSED_EMAIL_CONFIDENCE: f64 = 0.5;

/// Shared handle to the prospect store
pub type SharedStorage = Arc<Mutex<dyn Storage>>;

/// What to crawl, and who is believed to own it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlInput {
    pub target_url: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    /// Wall-clock budget for crawling and email discovery; the prospect is
    /// saved with whatever was found when it runs out
    pub time_limit: Option<Duration>,
}

impl CrawlInput {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Self::default()
        }
    }

    pub fn with_names(mut self, first: &str, middle: &str, last: &str) -> Self {
        self.first_name = first.to_string();
        self.middle_name = middle.to_string();
        self.last_name = last.to_string();
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

/// Social profile links found for a prospect, grouped by platform
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialNetworks {
    pub facebook: Vec<String>,
    pub twitter: Vec<String>,
    pub youtube: Vec<String>,
    pub linkedin: Vec<String>,
}

impl SocialNetworks {
    fn links_mut(&mut self, platform: SocialPlatform) -> &mut Vec<String> {
        match platform {
            SocialPlatform::Facebook => &mut self.facebook,
            SocialPlatform::Twitter => &mut self.twitter,
            SocialPlatform::Youtube => &mut self.youtube,
            SocialPlatform::Linkedin => &mut self.linkedin,
        }
    }

    pub fn links(&self, platform: SocialPlatform) -> &[String] {
        match platform {
            SocialPlatform::Facebook => &self.facebook,
            SocialPlatform::Twitter => &self.twitter,
            SocialPlatform::Youtube => &self.youtube,
            SocialPlatform::Linkedin => &self.linkedin,
        }
    }
}

/// Summary of one successful crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResponse {
    pub prospect_id: String,
    pub emails: Vec<String>,
    pub social_networks: SocialNetworks,
}

impl CrawlResponse {
    /// Builds the response from a persisted prospect
    ///
    /// Emails and social links are de-duplicated keeping first occurrence;
    /// social links are ordered by confidence, highest first.
    pub fn from_prospect(prospect_id: String, prospect: &Prospect) -> Self {
        let mut emails: Vec<String> = Vec::new();
        for email in prospect.values_of(SignalKind::Email) {
            if !emails.iter().any(|e| e == email) {
                emails.push(email.to_string());
            }
        }

        let mut social: Vec<_> = prospect
            .signals()
            .iter()
            .filter_map(|s| match s.kind {
                SignalKind::Social(platform) => Some((platform, s.value.as_str(), s.confidence)),
                _ => None,
            })
            .collect();
        // stable sort keeps discovery order among equal scores
        social.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut social_networks = SocialNetworks::default();
        for (platform, link, _) in social {
            let links = social_networks.links_mut(platform);
            if !links.iter().any(|l| l == link) {
                links.push(link.to_string());
            }
        }

        Self {
            prospect_id,
            emails,
            social_networks,
        }
    }
}

/// Anything able to crawl a website into a prospect
#[async_trait]
pub trait CrawlWebsite: Send + Sync {
    async fn crawl_website(&self, input: CrawlInput) -> Result<CrawlResponse>;
}

/// Crawls websites and stores the resulting prospects
pub struct Crawler {
    config: Arc<Config>,
    client: Client,
    storage: SharedStorage,
    prober: Arc<dyn MailboxProber>,
}

impl Crawler {
    /// Creates a crawler over an existing store and prober
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `storage` - Prospect store shared with the caller
    /// * `prober` - Mailbox prober used for scraped and guessed addresses
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(ProspectorError)` - The HTTP client could not be built
    pub fn new(
        config: Config,
        storage: SharedStorage,
        prober: Arc<dyn MailboxProber>,
    ) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        Ok(Self {
            config: Arc::new(config),
            client,
            storage,
            prober,
        })
    }

    /// Creates a crawler backed by the configured SQLite database and an
    /// SMTP prober
    pub fn from_config(config: Config) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let prober = SmtpProber::new(config.mail.clone());
        Self::new(config, Arc::new(Mutex::new(storage)), Arc::new(prober))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Crawls one website and persists the prospect
    ///
    /// When the input carries a time limit, the crawl session is cancelled and
    /// mailbox probing stops once it is spent; the signals gathered until then
    /// are still saved.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResponse)` - Prospect id plus emails and social links found
    /// * `Err(ProspectorError::EmptyTargetUrl)` - Blank target
    /// * `Err(ProspectorError::InvalidTargetUrl)` - Target is not an http(s) URL
    /// * `Err(ProspectorError::Storage)` - The prospect could not be saved
    pub async fn crawl(&self, input: CrawlInput) -> Result<CrawlResponse> {
        let target = input.target_url.trim();
        if target.is_empty() {
            return Err(ProspectorError::EmptyTargetUrl);
        }
        let seed = parse_target(target)?;

        let mut prospect = Prospect::new(target);
        prospect
            .set_first_name(&input.first_name)
            .set_middle_name(&input.middle_name)
            .set_last_name(&input.last_name);

        let started = Instant::now();
        let deadline = input.time_limit.map(|limit| started + limit);
        tracing::info!(url = %target, "Crawling");

        let cancel = CancellationToken::new();
        let timer = deadline.map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                cancel.cancel();
            })
        });

        let session = Arc::new(CrawlSession::new(seed, prospect, Arc::clone(&self.prober)));
        let scheduler = Scheduler::new(self.client.clone(), &self.config.crawler)
            .with_cancellation(cancel);
        let handler: Arc<dyn ResponseHandler> = session.clone();
        let stats = scheduler.run(session.seed_request(), handler).await;
        if let Some(timer) = timer {
            timer.abort();
        }

        match stats.end {
            CrawlEnd::Drained => tracing::debug!(url = %target, "Crawl queue drained"),
            CrawlEnd::Stopped => tracing::info!(url = %target, "Crawl stopped at its deadline"),
            CrawlEnd::Cancelled => tracing::info!(url = %target, "Crawl cancelled, keeping partial results"),
        }
        tracing::info!(
            url = %target,
            fetched = stats.fetched,
            failed = stats.failed,
            visited = session.visited().len(),
            "Crawl finished in {:?}",
            started.elapsed()
        );

        let mut prospect = session.prospect();

        match EmailDiscovery::new(Arc::clone(&self.prober))
            .with_deadline(deadline)
            .discover(&prospect)
            .await
        {
            DiscoveryOutcome::CatchAll => {
                tracing::info!(
                    url = %target,
                    domain = %prospect.domain(),
                    "Mail server accepts every address, skipping email guessing"
                );
            }
            DiscoveryOutcome::Found(emails) => {
                for email in &emails {
                    tracing::info!(url = %target, email = %email, "Guessed email accepted");
                    prospect.add_email(email, GUESSED_EMAIL_CONFIDENCE);
                }
            }
        }

        let prospect_id = {
            let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
            storage.save_prospect(&mut prospect)?
        };
        tracing::info!(url = %target, prospect_id = %prospect_id, "Prospect saved");

        Ok(CrawlResponse::from_prospect(prospect_id, &prospect))
    }
}

#[async_trait]
impl CrawlWebsite for Crawler {
    async fn crawl_website(&self, input: CrawlInput) -> Result<CrawlResponse> {
        self.crawl(input).await
    }
}

fn parse_target(target: &str) -> Result<Url> {
    let invalid = |reason: String| ProspectorError::InvalidTargetUrl {
        url: target.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
