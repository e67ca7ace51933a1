//! Email discovery
//!
//! Guesses a prospect's mailboxes by probing name-based candidates, after
//! ruling out domains whose mail server accepts any recipient.

use crate::email::permutations::{generate_candidates, NameParts};
use crate::email::prober::MailboxProber;
use crate::prospect::Prospect;
use std::sync::Arc;
use tokio::time::Instant;

/// Local part used to detect domains that accept every recipient
pub const CATCH_ALL_LOCAL_PART: &str = "all_policy_activated";

/// Result of guessing a prospect's mailboxes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// The domain accepts any local part, so probing proves nothing
    CatchAll,
    /// Candidates the mail server accepted, in probe order
    Found(Vec<String>),
}

impl DiscoveryOutcome {
    pub fn emails(&self) -> &[String] {
        match self {
            Self::CatchAll => &[],
            Self::Found(emails) => emails,
        }
    }
}

/// Generates candidate mailboxes from a prospect's name and keeps the ones a
/// mail server accepts
pub struct EmailDiscovery {
    prober: Arc<dyn MailboxProber>,
    deadline: Option<Instant>,
}

impl EmailDiscovery {
    pub fn new(prober: Arc<dyn MailboxProber>) -> Self {
        Self {
            prober,
            deadline: None,
        }
    }

    /// Stops probing once `deadline` passes, keeping what was found so far
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Probes candidates for the prospect's domain, one at a time
    ///
    /// A probe error counts as not reachable and is logged. A probe still
    /// pending at the deadline is abandoned.
    pub async fn discover(&self, prospect: &Prospect) -> DiscoveryOutcome {
        let domain = prospect.domain();
        if domain.is_empty() {
            tracing::warn!("No domain for prospect {}, skipping email discovery", prospect.url());
            return DiscoveryOutcome::Found(Vec::new());
        }

        let catch_all = format!("{}@{}", CATCH_ALL_LOCAL_PART, domain);
        match self.is_reachable(&catch_all).await {
            Some(true) => {
                tracing::info!("All policy activated on {}, skipping email guesses", domain);
                return DiscoveryOutcome::CatchAll;
            }
            Some(false) => {}
            None => return DiscoveryOutcome::Found(Vec::new()),
        }

        let name = NameParts::new(
            prospect.first_name(),
            prospect.middle_name(),
            prospect.last_name(),
        );
        let candidates = generate_candidates(&name, &domain);
        tracing::debug!("Probing {} candidate mailboxes for {}", candidates.len(), domain);

        let mut found = Vec::new();
        for candidate in candidates {
            match self.is_reachable(&candidate).await {
                Some(true) => {
                    tracing::info!(email = %candidate, "Found reachable mailbox");
                    found.push(candidate);
                }
                Some(false) => {}
                None => break,
            }
        }

        DiscoveryOutcome::Found(found)
    }

    /// `None` once the deadline has passed
    async fn is_reachable(&self, address: &str) -> Option<bool> {
        let probe = self.prober.probe(address);
        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, probe).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(email = %address, "Discovery deadline reached, stopping probes");
                    return None;
                }
            },
            None => probe.await,
        };

        match result {
            Ok(reachable) => Some(reachable),
            Err(e) => {
                tracing::warn!(email = %address, "Mailbox probe failed: {}", e);
                Some(false)
            }
        }
    }
}
