//! Storage module for persisting prospects
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Idempotent prospect saves keyed by seed URL
//! - Signal de-duplication
//! - Per-kind queries used by reports

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::prospect::SocialPlatform;
use serde::Serialize;

/// A stored prospect without its signals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProspectSummary {
    pub id: String,
    pub url: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub created_at: String,
}

/// A stored email address
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub email: String,
    pub confidence: f64,
    pub validated_by_user: bool,
}

/// A stored social profile link
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMediaRecord {
    #[serde(rename = "name")]
    pub platform: SocialPlatform,
    #[serde(rename = "link")]
    pub url: String,
    pub confidence: f64,
    pub validated_by_user: bool,
}

/// Visual assets of a prospect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assets {
    pub icons: Vec<String>,
}
