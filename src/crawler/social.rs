//! Social profile detection
//!
//! A link is matched against a fixed set of platform URL prefixes. The
//! confidence of a match is how closely the profile slug resembles the
//! crawled site's brand name.

use crate::prospect::SocialPlatform;

/// Known social profile URL shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialStrategy {
    Twitter,
    Facebook,
    Youtube,
    LinkedinPersonal,
    LinkedinCompany,
}

impl SocialStrategy {
    pub const ALL: [SocialStrategy; 5] = [
        SocialStrategy::Twitter,
        SocialStrategy::Facebook,
        SocialStrategy::Youtube,
        SocialStrategy::LinkedinPersonal,
        SocialStrategy::LinkedinCompany,
    ];

    pub fn url_prefix(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter.com/",
            Self::Facebook => "facebook.com/",
            Self::Youtube => "youtube.com/",
            Self::LinkedinPersonal => "linkedin.com/in/",
            Self::LinkedinCompany => "linkedin.com/company/",
        }
    }

    pub fn platform(&self) -> SocialPlatform {
        match self {
            Self::Twitter => SocialPlatform::Twitter,
            Self::Facebook => SocialPlatform::Facebook,
            Self::Youtube => SocialPlatform::Youtube,
            Self::LinkedinPersonal | Self::LinkedinCompany => SocialPlatform::Linkedin,
        }
    }
}

/// A link recognised as a social profile
#[derive(Debug, Clone, PartialEq)]
pub struct SocialMatch {
    pub platform: SocialPlatform,
    pub url: String,
    pub confidence: f64,
}

/// Matches a URL against every strategy
///
/// Share links (any URL containing `share`) never match. Each strategy whose
/// prefix appears in the URL yields its own match.
///
/// # Arguments
///
/// * `url` - Absolute link found on a page
/// * `brand` - Domain name without extension of the crawled site
pub fn detect_social(url: &str, brand: &str) -> Vec<SocialMatch> {
    if url.contains("share") {
        return Vec::new();
    }

    SocialStrategy::ALL
        .iter()
        .filter_map(|strategy| {
            let prefix = strategy.url_prefix();
            let start = url.find(prefix)? + prefix.len();
            let slug = profile_slug(&url[start..]);
            let confidence = if slug.is_empty() {
                0.0
            } else {
                similarity(slug, brand)
            };
            Some(SocialMatch {
                platform: strategy.platform(),
                url: url.to_string(),
                confidence,
            })
        })
        .collect()
}

fn profile_slug(rest: &str) -> &str {
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Case-insensitive normalized Levenshtein similarity in `[0, 1]`
///
/// `1 - distance / max(len(a), len(b))`, lengths counted in characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(&a, &b);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}
