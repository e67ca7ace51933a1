//! Page extractor
//!
//! Turns one fetched HTML page into prospect signals and new crawl requests:
//! 1. head metadata (icons, tags, description)
//! 2. body links: social profiles, mailto addresses, same-host links to enqueue
//! 3. email addresses in the page text
//! 4. the owner's name from self-introduction phrases
//!
//! Every address found is format-checked and probed before it is kept.

use crate::crawler::names::find_name;
use crate::crawler::parser::{mailto_address, parse_page, resolve_link, ParsedPage};
use crate::crawler::scheduler::QueueHandle;
use crate::crawler::session::VisitedSet;
use crate::crawler::social::detect_social;
use crate::email::{find_emails_in_text, is_valid_format, MailboxProber};
use crate::prospect::Prospect;
use crate::url::{extract_domain, is_first_level, normalize_url};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// Confidence given to addresses seen on the site itself
pub const SCRAPED_EMAIL_CONFIDENCE: f64 = 1.0;

/// Extracts signals from pages of one crawl session
pub struct PageExtractor {
    prospect: Arc<Mutex<Prospect>>,
    visited: Arc<VisitedSet>,
    seed: Url,
    brand: String,
    prober: Arc<dyn MailboxProber>,
    probed: Mutex<HashSet<String>>,
}

impl PageExtractor {
    pub fn new(
        prospect: Arc<Mutex<Prospect>>,
        visited: Arc<VisitedSet>,
        seed: Url,
        prober: Arc<dyn MailboxProber>,
    ) -> Self {
        let brand = lock(&prospect).domain_name_without_extension();
        Self {
            prospect,
            visited,
            seed,
            brand,
            prober,
            probed: Mutex::new(HashSet::new()),
        }
    }

    /// Processes one HTML page
    ///
    /// # Arguments
    ///
    /// * `page_url` - URL the page was fetched from, used to resolve links
    /// * `body` - HTML document
    /// * `queue` - Crawl queue for same-host links
    pub async fn extract(&self, page_url: &str, body: &str, queue: &QueueHandle) {
        let base = match Url::parse(page_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %page_url, "Cannot extract from unparsable page URL: {}", e);
                return;
            }
        };

        let page = parse_page(body);
        self.record_head_metadata(&page);

        let mut addresses = self.process_links(&page, &base, queue);
        for address in find_emails_in_text(&page.text) {
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        if let Some(name) = find_name(&page.text) {
            tracing::info!(first_name = %name.first, last_name = %name.last, "Found name");
            lock(&self.prospect)
                .set_first_name(&name.first)
                .set_last_name(&name.last);
        }

        for address in addresses {
            self.check_address(&address).await;
        }
    }

    fn record_head_metadata(&self, page: &ParsedPage) {
        let mut prospect = lock(&self.prospect);

        for icon in &page.icons {
            tracing::debug!("Found icon: {}", icon);
            prospect.add_icon(icon);
        }
        for tag in &page.keywords {
            tracing::debug!("Found tag: {}", tag);
            prospect.add_tag(tag);
        }
        for description in &page.descriptions {
            tracing::debug!("Found description: {}", description);
            prospect.add_description(description);
        }
    }

    /// Detects social profiles, enqueues eligible links and returns mailto addresses
    fn process_links(&self, page: &ParsedPage, base: &Url, queue: &QueueHandle) -> Vec<String> {
        let mut addresses = Vec::new();

        for href in &page.hrefs {
            if let Some(address) = mailto_address(href) {
                if !addresses.contains(&address) {
                    addresses.push(address);
                }
                continue;
            }

            let Some(resolved) = resolve_link(href, base) else {
                continue;
            };
            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }

            let link = resolved.as_str();
            let socials = detect_social(link, &self.brand);
            if !socials.is_empty() {
                let mut prospect = lock(&self.prospect);
                for social in socials {
                    tracing::debug!(
                        "Found {} profile {} (confidence {:.2})",
                        social.platform,
                        social.url,
                        social.confidence
                    );
                    prospect.add_social(social.platform, &social.url, social.confidence);
                }
            }

            if self.should_enqueue(&resolved) {
                if let Err(e) = queue.send_get(link) {
                    tracing::warn!(url = %link, "Failed to enqueue link: {}", e);
                }
            }
        }

        addresses
    }

    /// Depth, host and first-visit checks; marks the link visited on success
    fn should_enqueue(&self, link: &Url) -> bool {
        if !is_first_level(link.as_str()) || !self.same_site(link) {
            return false;
        }

        match normalize_url(link.as_str()) {
            Ok(normalized) => self.visited.insert(normalized.as_str()),
            Err(e) => {
                tracing::debug!(url = %link, "Skipping link that cannot be normalized: {}", e);
                false
            }
        }
    }

    fn same_site(&self, link: &Url) -> bool {
        extract_domain(link) == extract_domain(&self.seed)
            && link.port_or_known_default() == self.seed.port_or_known_default()
    }

    async fn check_address(&self, address: &str) {
        if !is_valid_format(address) {
            tracing::debug!(email = %address, "Skipping malformed address");
            return;
        }

        let first_time = self
            .probed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.to_lowercase());
        if !first_time {
            return;
        }

        match self.prober.probe(address).await {
            Ok(true) => {
                tracing::info!(email = %address, "Found valid address");
                lock(&self.prospect).add_email(address, SCRAPED_EMAIL_CONFIDENCE);
            }
            Ok(false) => {
                tracing::info!(email = %address, "Mail server rejected address");
            }
            Err(e) => {
                tracing::warn!(email = %address, "Could not verify address: {}", e);
            }
        }
    }
}

fn lock(prospect: &Mutex<Prospect>) -> std::sync::MutexGuard<'_, Prospect> {
    prospect.lock().unwrap_or_else(PoisonError::into_inner)
}
