//! Prospector: a lead-prospecting crawler
//!
//! This crate crawls a website from a seed URL, extracts contact and identity
//! signals (emails, social profiles, icons, tags, description, owner name),
//! guesses the owner's mailbox by probing mail servers, and persists the
//! result as a prospect record.

pub mod config;
pub mod crawler;
pub mod email;
pub mod lock;
pub mod output;
pub mod prospect;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Prospector operations
#[derive(Debug, Error)]
pub enum ProspectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("empty target URL")]
    EmptyTargetUrl,

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Another instance is already running (lock file {0})")]
    InstanceLocked(std::path::PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Prospector operations
pub type Result<T> = std::result::Result<T, ProspectorError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_batch, CrawlInput, CrawlResponse, CrawlWebsite, Crawler};
pub use prospect::{Prospect, Signal, SignalKind, SocialPlatform};
pub use url::{link_depth, normalize_url, registrable_domain};
