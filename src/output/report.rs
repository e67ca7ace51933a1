//! Prospect report assembly and rendering

use crate::crawler::BatchReport;
use crate::output::OutputResult;
use crate::storage::{
    Assets, EmailRecord, ProspectSummary, SocialMediaRecord, Storage, StorageResult,
};
use crate::url::extract_domain;
use serde::Serialize;
use std::fmt::Write;
use url::Url;

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything known about one prospect
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectReport {
    pub id: String,
    pub url: String,
    pub host: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub description: String,
    pub emails: Vec<EmailRecord>,
    pub social_media: Vec<SocialMediaRecord>,
    pub assets: Assets,
    pub tags: Vec<String>,
    pub created_at: String,
}

impl ProspectReport {
    /// Owner name as "first middle last", skipping empty parts
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builds the report of one stored prospect
pub fn build_report(
    storage: &dyn Storage,
    summary: ProspectSummary,
) -> StorageResult<ProspectReport> {
    let id = summary.id.as_str();
    let emails = storage.get_emails(id)?;
    let social_media = storage.get_social_media(id)?;
    let assets = storage.get_assets(id)?;
    let tags = storage.get_tags(id)?;
    let description = storage.get_description(id)?.unwrap_or_default();
    let host = Url::parse(&summary.url)
        .ok()
        .as_ref()
        .and_then(extract_domain)
        .unwrap_or_default();

    Ok(ProspectReport {
        id: summary.id,
        url: summary.url,
        host,
        first_name: summary.first_name,
        middle_name: summary.middle_name,
        last_name: summary.last_name,
        description,
        emails,
        social_media,
        assets,
        tags,
        created_at: summary.created_at,
    })
}

/// Builds the reports of every stored prospect
///
/// A prospect whose lookups fail is skipped with a warning; only a failure
/// to list prospects is an error.
pub fn build_reports(storage: &dyn Storage) -> StorageResult<Vec<ProspectReport>> {
    let mut reports = Vec::new();
    for summary in storage.list_prospects()? {
        let id = summary.id.clone();
        match build_report(storage, summary) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!(prospect_id = %id, "Skipping prospect: {}", e),
        }
    }
    Ok(reports)
}

/// Renders reports for the terminal
pub fn format_reports(reports: &[ProspectReport], format: OutputFormat) -> OutputResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Text => {
            let mut out = String::new();
            for report in reports {
                format_text_report(&mut out, report);
            }
            if reports.is_empty() {
                out.push_str("No prospects stored.\n");
            }
            Ok(out)
        }
    }
}

fn format_text_report(out: &mut String, report: &ProspectReport) {
    let _ = writeln!(out, "=== {} ===", report.url);
    let _ = writeln!(out, "  ID: {}", report.id);
    let _ = writeln!(out, "  Host: {}", report.host);
    let name = report.full_name();
    if !name.is_empty() {
        let _ = writeln!(out, "  Name: {}", name);
    }
    if !report.description.is_empty() {
        let _ = writeln!(out, "  Description: {}", report.description);
    }

    if !report.emails.is_empty() {
        let _ = writeln!(out, "  Emails:");
        for email in &report.emails {
            let _ = writeln!(out, "    - {} ({:.2})", email.email, email.confidence);
        }
    }
    if !report.social_media.is_empty() {
        let _ = writeln!(out, "  Social media:");
        for social in &report.social_media {
            let _ = writeln!(
                out,
                "    - {}: {} ({:.2})",
                social.platform, social.url, social.confidence
            );
        }
    }
    if !report.assets.icons.is_empty() {
        let _ = writeln!(out, "  Icons:");
        for icon in &report.assets.icons {
            let _ = writeln!(out, "    - {}", icon);
        }
    }
    if !report.tags.is_empty() {
        let _ = writeln!(out, "  Tags: {}", report.tags.join(", "));
    }
    out.push('\n');
}

/// Renders the result of a batch crawl
pub fn format_batch_report(report: &BatchReport, format: OutputFormat) -> OutputResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(
                out,
                "Crawled {} websites: {} succeeded, {} failed",
                report.details.len(),
                report.number_of_success,
                report.number_of_fails
            );
            for detail in &report.details {
                if detail.error {
                    let _ = writeln!(out, "  ✗ {}: {}", detail.url, detail.reason);
                } else {
                    let _ = writeln!(out, "  ✓ {}", detail.url);
                }
            }
            Ok(out)
        }
    }
}
