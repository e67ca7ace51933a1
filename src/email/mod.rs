//! Email discovery module
//!
//! This module guesses a prospect's mailboxes:
//! - Candidate local parts generated from the owner's name
//! - SMTP-level reachability probing against the domain's mail exchanger
//! - Catch-all detection before any guess is probed

mod discovery;
mod permutations;
mod prober;

pub use discovery::{DiscoveryOutcome, EmailDiscovery, CATCH_ALL_LOCAL_PART};
pub use permutations::{generate_candidates, generate_local_parts, NameParts, ROLE_MAILBOXES, TEMPLATES};
pub use prober::{MailboxProber, ProbeError, SmtpProber};

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .unwrap_or_else(|e| panic!("invalid email format pattern: {}", e))
});

static EMAIL_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .unwrap_or_else(|e| panic!("invalid email text pattern: {}", e))
});

/// Checks the syntax of an email address
///
/// # Examples
///
/// ```
/// use prospector::email::is_valid_format;
///
/// assert!(is_valid_format("info@example.com"));
/// assert!(!is_valid_format("info@"));
/// ```
pub fn is_valid_format(address: &str) -> bool {
    address.len() <= 254 && EMAIL_FORMAT.is_match(address)
}

/// Finds email-looking strings in free text, first occurrence order, no repeats
pub fn find_emails_in_text(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in EMAIL_IN_TEXT.find_iter(text) {
        let address = m.as_str().trim_end_matches('.').to_string();
        if !found.contains(&address) {
            found.push(address);
        }
    }
    found
}
