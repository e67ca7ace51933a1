//! Owner name discovery in page text

use once_cell::sync::Lazy;
use regex::Regex;

/// Self-introduction phrases, applied in this order
static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NAME: &str = r"\s+([A-Z]\w+)\s+([A-Z]\w+)";
    [
        r"\b(?i:my\s+name\s+is)",
        r"\b(?i:i\s+am)",
        r"\b(?i:i'm)",
        r"\b(?i:i’m)",
    ]
    .iter()
    .filter_map(|lead| match Regex::new(&format!("{}{}", lead, NAME)) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid name pattern {}: {}", lead, e);
            None
        }
    })
    .collect()
});

/// A first/last name pair found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundName {
    pub first: String,
    pub last: String,
}

/// Scans text for "my name is F L", "I am F L" and "I'm F L"
///
/// The lead phrase is case-insensitive, both name tokens must start with an
/// uppercase letter. Every match overwrites the previous one, so the last
/// match of the last pattern that matched is returned.
pub fn find_name(text: &str) -> Option<FoundName> {
    let mut found = None;

    for pattern in NAME_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let (Some(first), Some(last)) = (caps.get(1), caps.get(2)) {
                found = Some(FoundName {
                    first: first.as_str().to_string(),
                    last: last.as_str().to_string(),
                });
            }
        }
    }

    found
}
