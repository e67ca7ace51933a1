//! Markdown report generation
//!
//! This module generates a human-readable markdown report of every stored
//! prospect, including contacts, social profiles and site metadata.

use crate::output::report::ProspectReport;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report of the given prospects
///
/// # Arguments
///
/// * `reports` - Prospect reports to render
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(reports: &[ProspectReport], output_path: &Path) -> OutputResult<()> {
    let generated_at = chrono::Utc::now().to_rfc3339();
    let markdown = format_markdown_report(reports, &generated_at);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats prospect reports as markdown
///
/// # Arguments
///
/// * `reports` - Prospect reports to render
/// * `generated_at` - Timestamp printed in the header
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(reports: &[ProspectReport], generated_at: &str) -> String {
    let mut md = String::new();

    md.push_str("# Prospect Report\n\n");
    md.push_str(&format!("- **Generated**: {}\n", generated_at));
    md.push_str(&format!("- **Prospects**: {}\n", reports.len()));
    let with_email = reports.iter().filter(|r| !r.emails.is_empty()).count();
    md.push_str(&format!("- **With at least one email**: {}\n\n", with_email));

    if reports.is_empty() {
        return md;
    }

    // Overview
    md.push_str("## Overview\n\n");
    md.push_str("| Host | Name | Best email | Social profiles |\n");
    md.push_str("|------|------|------------|-----------------|\n");
    for report in reports {
        let best_email = report
            .emails
            .first()
            .map(|e| format!("{} ({:.2})", e.email, e.confidence))
            .unwrap_or_else(|| "-".to_string());
        let name = report.full_name();
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&report.host),
            if name.is_empty() { "-".to_string() } else { escape_cell(&name) },
            escape_cell(&best_email),
            report.social_media.len()
        ));
    }
    md.push('\n');

    // Details
    for report in reports {
        md.push_str(&format!("## {}\n\n", report.host));
        md.push_str(&format!("- **ID**: {}\n", report.id));
        md.push_str(&format!("- **URL**: {}\n", report.url));
        md.push_str(&format!("- **Crawled**: {}\n", report.created_at));
        if !report.description.is_empty() {
            md.push_str(&format!("- **Description**: {}\n", report.description));
        }
        if !report.tags.is_empty() {
            md.push_str(&format!("- **Tags**: {}\n", report.tags.join(", ")));
        }
        md.push('\n');

        if !report.emails.is_empty() {
            md.push_str("| Email | Confidence | Validated |\n");
            md.push_str("|-------|------------|-----------|\n");
            for email in &report.emails {
                md.push_str(&format!(
                    "| {} | {:.2} | {} |\n",
                    escape_cell(&email.email),
                    email.confidence,
                    if email.validated_by_user { "yes" } else { "no" }
                ));
            }
            md.push('\n');
        }

        if !report.social_media.is_empty() {
            md.push_str("| Platform | Link | Confidence |\n");
            md.push_str("|----------|------|------------|\n");
            for social in &report.social_media {
                md.push_str(&format!(
                    "| {} | {} | {:.2} |\n",
                    social.platform,
                    escape_cell(&social.url),
                    social.confidence
                ));
            }
            md.push('\n');
        }

        if !report.assets.icons.is_empty() {
            md.push_str("Icons:\n\n");
            for icon in &report.assets.icons {
                md.push_str(&format!("- {}\n", icon));
            }
            md.push('\n');
        }
    }

    md
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
