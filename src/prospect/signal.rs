use serde::Serialize;
use std::fmt;

/// Social platforms recognised by the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Facebook,
    Youtube,
    Linkedin,
}

impl SocialPlatform {
    /// All platforms, in reporting order
    pub const ALL: [SocialPlatform; 4] = [
        SocialPlatform::Facebook,
        SocialPlatform::Twitter,
        SocialPlatform::Youtube,
        SocialPlatform::Linkedin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Youtube => "youtube",
            Self::Linkedin => "linkedin",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "twitter" => Some(Self::Twitter),
            "facebook" => Some(Self::Facebook),
            "youtube" => Some(Self::Youtube),
            "linkedin" => Some(Self::Linkedin),
            _ => None,
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of fact a signal records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Domain,
    Email,
    Social(SocialPlatform),
    Icon,
    Tag,
    Description,
}

impl SignalKind {
    pub fn to_db_string(&self) -> String {
        match self {
            Self::Domain => "domain".to_string(),
            Self::Email => "email".to_string(),
            Self::Social(platform) => format!("social:{}", platform.name()),
            Self::Icon => "icon".to_string(),
            Self::Tag => "tag".to_string(),
            Self::Description => "description".to_string(),
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "domain" => Some(Self::Domain),
            "email" => Some(Self::Email),
            "icon" => Some(Self::Icon),
            "tag" => Some(Self::Tag),
            "description" => Some(Self::Description),
            other => other
                .strip_prefix("social:")
                .and_then(SocialPlatform::from_name)
                .map(Self::Social),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_db_string())
    }
}

/// One typed, confidence-scored fact attached to a prospect
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub value: String,
    /// Plausibility in `[0, 1]`
    pub confidence: f64,
    /// Set by a human reviewer, never by the crawler
    pub validated_by_user: bool,
}

impl Signal {
    /// Creates an unvalidated signal, clamping the confidence into `[0, 1]`
    pub fn new(kind: SignalKind, value: impl Into<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            kind,
            value: value.into(),
            confidence,
            validated_by_user: false,
        }
    }
}
