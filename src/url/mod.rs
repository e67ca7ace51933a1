//! URL handling module for Prospector
//!
//! This module provides URL normalization for the visited-URL set, domain
//! extraction and the link depth rule that bounds a crawl.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_name_without_extension, extract_domain, registrable_domain};
pub use normalize::normalize_url;

/// Maximum link depth that is enqueued during a crawl
pub const MAX_LINK_DEPTH: usize = 1;

/// Computes the path depth of a URL
///
/// The scheme separator `://` is removed, then one trailing `/`, and the
/// remaining slashes are counted. Query strings are not special: a slash
/// inside the query counts like any other.
///
/// # Examples
///
/// ```
/// use prospector::url::link_depth;
///
/// assert_eq!(link_depth("http://x.com"), 0);
/// assert_eq!(link_depth("http://x.com/a"), 1);
/// assert_eq!(link_depth("http://x.com/a/b"), 2);
/// ```
pub fn link_depth(url: &str) -> usize {
    let stripped = url.replace("://", "");
    let stripped = stripped.strip_suffix('/').unwrap_or(&stripped);
    stripped.matches('/').count()
}

/// Returns true if a URL is shallow enough to be enqueued
pub fn is_first_level(url: &str) -> bool {
    link_depth(url) <= MAX_LINK_DEPTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_depth_examples() {
        assert_eq!(link_depth("http://x.com/a/b"), 2);
        assert_eq!(link_depth("http://x.com/a"), 1);
        assert_eq!(link_depth("http://x.com"), 0);
    }

    #[test]
    fn test_link_depth_trailing_slash() {
        assert_eq!(link_depth("http://x.com/"), 0);
        assert_eq!(link_depth("http://x.com/a/"), 1);
        assert_eq!(link_depth("https://x.com/a/b/"), 2);
    }

    #[test]
    fn test_is_first_level() {
        assert!(is_first_level("http://x.com"));
        assert!(is_first_level("http://x.com/about"));
        assert!(!is_first_level("http://x.com/blog/post"));
    }
}
