//! Output module for prospect reports
//!
//! This module handles:
//! - Assembling per-prospect reports from storage
//! - Rendering reports and batch results as text or JSON
//! - Exporting a markdown report of every prospect

mod markdown;
mod report;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use report::{
    build_report, build_reports, format_batch_report, format_reports, OutputFormat,
    ProspectReport,
};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
