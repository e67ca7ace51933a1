//! Prospect aggregate
//!
//! A prospect is the record built by one crawl: the seed URL, an optional
//! owner name and the signals discovered along the way. Signals are only
//! appended here; de-duplication happens when the prospect is saved.

mod signal;

pub use signal::{Signal, SignalKind, SocialPlatform};

use crate::url::{domain_name_without_extension, extract_domain, registrable_domain};
use url::Url;

/// The structured record being built for one crawled site
#[derive(Debug, Clone)]
pub struct Prospect {
    /// Persisted identifier, assigned on first save
    pub id: Option<String>,
    url: String,
    first_name: String,
    middle_name: String,
    last_name: String,
    signals: Vec<Signal>,
}

impl Prospect {
    /// Creates a prospect for a seed URL
    ///
    /// The URL is kept as given (trimmed) and recorded as a `domain` signal
    /// with full confidence.
    pub fn new(url: &str) -> Self {
        let url = url.trim().to_string();
        let mut prospect = Self {
            id: None,
            url: url.clone(),
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            signals: Vec::new(),
        };
        prospect.push(SignalKind::Domain, url, 1.0);
        prospect
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn middle_name(&self) -> &str {
        &self.middle_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn set_first_name(&mut self, name: &str) -> &mut Self {
        self.first_name = name.trim().to_lowercase();
        self
    }

    pub fn set_middle_name(&mut self, name: &str) -> &mut Self {
        self.middle_name = name.trim().to_lowercase();
        self
    }

    pub fn set_last_name(&mut self, name: &str) -> &mut Self {
        self.last_name = name.trim().to_lowercase();
        self
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Returns the values of all signals of one kind, in insertion order
    pub fn values_of(&self, kind: SignalKind) -> Vec<&str> {
        self.signals
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.value.as_str())
            .collect()
    }

    /// Lowercase host of the seed URL
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url).ok().as_ref().and_then(extract_domain)
    }

    /// Registrable domain of the seed (`www.example.com` gives `example.com`)
    pub fn domain(&self) -> String {
        self.host().map(|h| registrable_domain(&h)).unwrap_or_default()
    }

    /// Brand part of the seed domain (`example.com` gives `example`)
    pub fn domain_name_without_extension(&self) -> String {
        self.host()
            .map(|h| domain_name_without_extension(&h))
            .unwrap_or_default()
    }

    /// Scheme, host and port of the seed URL
    pub fn base_url(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .map(|u| u.origin().ascii_serialization())
            .filter(|origin| origin != "null")
    }

    /// Records an icon link; a site-relative `/path` is resolved against the seed
    pub fn add_icon(&mut self, link: &str) -> &mut Self {
        let link = match (link.starts_with('/') && !link.starts_with("//"), self.base_url()) {
            (true, Some(base)) => format!("{}{}", base, link),
            _ => link.to_string(),
        };
        self.push(SignalKind::Icon, link, 1.0)
    }

    pub fn add_tag(&mut self, tag: &str) -> &mut Self {
        self.push(SignalKind::Tag, tag, 1.0)
    }

    pub fn add_description(&mut self, description: &str) -> &mut Self {
        self.push(SignalKind::Description, description, 1.0)
    }

    pub fn add_social(&mut self, platform: SocialPlatform, url: &str, confidence: f64) -> &mut Self {
        self.push(SignalKind::Social(platform), url, confidence)
    }

    pub fn add_email(&mut self, address: &str, confidence: f64) -> &mut Self {
        self.push(SignalKind::Email, address, confidence)
    }

    fn push(&mut self, kind: SignalKind, value: impl Into<String>, confidence: f64) -> &mut Self {
        self.signals.push(Signal::new(kind, value, confidence));
        self
    }
}
