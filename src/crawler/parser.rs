//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Icon links, keywords and description from `<head>`
//! - Raw `<a href>` values from `<body>`
//! - Whitespace-collapsed body text for email and name matching

use scraper::{Html, Selector};
use url::Url;

/// Image extensions accepted as site icons
const ICON_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".bmp", ".ico"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Decoded `<link href>` values in head that point at an image
    pub icons: Vec<String>,

    /// Trimmed, non-empty tokens of every `<meta name="keywords">`
    pub keywords: Vec<String>,

    /// Content of every `<meta name="description">`
    pub descriptions: Vec<String>,

    /// Raw href of every `<a>` in body, in document order
    pub hrefs: Vec<String>,

    /// Body text with runs of whitespace collapsed to one space
    pub text: String,
}

/// Parses an HTML document
///
/// The parsed DOM is dropped before returning, so the result can be held
/// across `.await` points.
///
/// # Example
///
/// ```
/// use prospector::crawler::parse_page;
///
/// let html = r#"<html><head><meta name="keywords" content="rust, crawler"></head>
///     <body><a href="/about">About</a> I'm   Jane Doe</body></html>"#;
/// let page = parse_page(html);
/// assert_eq!(page.keywords, vec!["rust", "crawler"]);
/// assert_eq!(page.hrefs, vec!["/about"]);
/// assert_eq!(page.text, "About I'm Jane Doe");
/// ```
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        icons: extract_icons(&document),
        keywords: extract_keywords(&document),
        descriptions: extract_meta_contents(&document, r#"head meta[name="description"]"#),
        hrefs: extract_hrefs(&document),
        text: extract_text(&document),
    }
}

fn extract_icons(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("head link[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(decode_uri_component)
        .filter(|href| is_image_link(href))
        .collect()
}

fn extract_keywords(document: &Html) -> Vec<String> {
    extract_meta_contents(document, r#"head meta[name="keywords"]"#)
        .iter()
        .flat_map(|content| content.split(','))
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn extract_meta_contents(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(decode_uri_component)
        .collect()
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("body a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

fn extract_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    let raw: String = document
        .select(&selector)
        .flat_map(|body| body.text())
        .collect::<Vec<_>>()
        .join(" ");
    standardize_spaces(&raw)
}

/// Collapses every run of whitespace to a single space and trims the ends
pub fn standardize_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes the handful of escapes commonly left in head attributes
fn decode_uri_component(s: &str) -> String {
    s.replace("%20", " ")
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// Returns true if a link ends with a known image extension
pub fn is_image_link(link: &str) -> bool {
    let lower = link.to_lowercase();
    ICON_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Resolves a link href against the page URL
///
/// Returns None if the link should be excluded:
/// - javascript:, tel:, data: schemes
/// - fragment-only links (same page anchors)
/// - hrefs the URL parser rejects
///
/// `mailto:` links resolve to a `mailto` URL and are left to the caller.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("tel:") || lower.starts_with("data:") {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute_url) => {
            absolute_url.set_fragment(None);
            Some(absolute_url)
        }
        Err(e) => {
            tracing::warn!(url = %href, "Failed to resolve link against {}: {}", base_url, e);
            None
        }
    }
}

/// Extracts the address of a `mailto:` href, dropping any `?subject=` part
pub fn mailto_address(href: &str) -> Option<String> {
    let href = href.trim();
    let prefix = href.get(..7)?;
    if !prefix.eq_ignore_ascii_case("mailto:") {
        return None;
    }

    let address = href[7..].split('?').next().unwrap_or("").trim();
    let address = address.replace("%40", "@").replace("%20", "");
    if address.is_empty() {
        None
    } else {
        Some(address)
    }
}
