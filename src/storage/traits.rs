//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::prospect::{Prospect, Signal, SignalKind};
use crate::storage::{Assets, EmailRecord, ProspectSummary, SocialMediaRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Prospect not found: {0}")]
    ProspectNotFound(String),

    #[error("Unknown signal kind in database: {0}")]
    UnknownSignalKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for prospect store implementations
///
/// Implementations are used behind a mutex shared by concurrent crawls, so
/// they must be `Send`.
pub trait Storage: Send {
    // ===== Writes =====

    /// Persists a prospect and its signals
    ///
    /// An existing prospect with the same URL is reused, so re-crawling a
    /// site never duplicates the prospect. Stored names are replaced only by
    /// non-empty values. A signal identical in kind, value, confidence and
    /// validation flag to one already stored is skipped.
    ///
    /// # Returns
    ///
    /// The prospect id, which is also written back into `prospect.id`
    fn save_prospect(&mut self, prospect: &mut Prospect) -> StorageResult<String>;

    /// Deletes a prospect and all of its signals in one transaction
    fn delete_prospect(&mut self, prospect_id: &str) -> StorageResult<()>;

    // ===== Reads =====

    /// Lists every stored prospect, oldest first
    fn list_prospects(&self) -> StorageResult<Vec<ProspectSummary>>;

    /// Gets one prospect by id
    fn get_prospect(&self, prospect_id: &str) -> StorageResult<ProspectSummary>;

    /// Gets email signals, highest confidence first
    fn get_emails(&self, prospect_id: &str) -> StorageResult<Vec<EmailRecord>>;

    /// Gets the best-scored social link of each platform
    fn get_social_media(&self, prospect_id: &str) -> StorageResult<Vec<SocialMediaRecord>>;

    /// Gets visual assets (icons)
    fn get_assets(&self, prospect_id: &str) -> StorageResult<Assets>;

    /// Gets keyword tags
    fn get_tags(&self, prospect_id: &str) -> StorageResult<Vec<String>>;

    /// Gets the first stored description, if any
    fn get_description(&self, prospect_id: &str) -> StorageResult<Option<String>>;

    /// Gets every signal of one kind, in insertion order
    fn get_signals(&self, prospect_id: &str, kind: &SignalKind) -> StorageResult<Vec<Signal>>;
}
