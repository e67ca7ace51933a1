//! Name-based mailbox candidate generation

use std::collections::HashSet;

/// Local-part templates, most common corporate conventions first
///
/// Placeholders: `{fn}` first name, `{fi}` first initial, `{mn}` middle name,
/// `{mi}` middle initial, `{ln}` last name, `{li}` last initial.
pub const TEMPLATES: [&str; 46] = [
    "{fn}",
    "{ln}",
    "{fn}{ln}",
    "{fn}.{ln}",
    "{fi}{ln}",
    "{fi}.{ln}",
    "{fn}{li}",
    "{fn}.{li}",
    "{fi}{li}",
    "{fi}.{li}",
    "{ln}{fn}",
    "{ln}.{fn}",
    "{ln}{fi}",
    "{ln}.{fi}",
    "{li}{fn}",
    "{li}.{fn}",
    "{li}{fi}",
    "{li}.{fi}",
    "{fi}{mi}{ln}",
    "{fi}{mi}.{ln}",
    "{fn}{mi}{ln}",
    "{fn}.{mi}.{ln}",
    "{fn}{mn}{ln}",
    "{fn}.{mn}.{ln}",
    "{fn}-{ln}",
    "{fi}-{ln}",
    "{fn}-{li}",
    "{fi}-{li}",
    "{ln}-{fn}",
    "{ln}-{fi}",
    "{li}-{fn}",
    "{li}-{fi}",
    "{fi}{mi}-{ln}",
    "{fn}-{mi}-{ln}",
    "{fn}-{mn}-{ln}",
    "{fn}_{ln}",
    "{fi}_{ln}",
    "{fn}_{li}",
    "{fi}_{li}",
    "{ln}_{fn}",
    "{ln}_{fi}",
    "{li}_{fn}",
    "{li}_{fi}",
    "{fi}{mi}_{ln}",
    "{fn}_{mi}_{ln}",
    "{fn}_{mn}_{ln}",
];

/// Role mailboxes tried at the crawled domain regardless of the owner's name
pub const ROLE_MAILBOXES: [&str; 6] = ["contact", "blog", "info", "infos", "admin", "support"];

/// Name parts substituted into the templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    first: String,
    middle: String,
    last: String,
}

impl NameParts {
    pub fn new(first: &str, middle: &str, last: &str) -> Self {
        Self {
            first: first.trim().to_lowercase(),
            middle: middle.trim().to_lowercase(),
            last: last.trim().to_lowercase(),
        }
    }

    fn placeholder(&self, key: &str) -> Option<String> {
        let value = match key {
            "fn" => self.first.clone(),
            "fi" => initial(&self.first),
            "mn" => self.middle.clone(),
            "mi" => initial(&self.middle),
            "ln" => self.last.clone(),
            "li" => initial(&self.last),
            _ => return None,
        };
        Some(value)
    }

    /// Expands one template; unknown placeholders are kept verbatim
    pub fn expand(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 16);
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[1..end];
                    match self.placeholder(key) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(&after[..=end]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(after);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn initial(name: &str) -> String {
    name.chars().next().map(String::from).unwrap_or_default()
}

fn distinct_chars(s: &str) -> usize {
    s.chars().collect::<HashSet<_>>().len()
}

/// Expands every template for the given name
///
/// Results with one or fewer distinct characters (`.`, `-`, `aa`, empty) are
/// discarded, and duplicates are dropped keeping the first occurrence.
pub fn generate_local_parts(name: &NameParts) -> Vec<String> {
    let mut seen = HashSet::new();
    TEMPLATES
        .iter()
        .map(|template| name.expand(template))
        .filter(|local| distinct_chars(local) > 1)
        .filter(|local| seen.insert(local.clone()))
        .collect()
}

/// Builds the full candidate list for a domain
///
/// Every local part is combined with the crawled domain and `google.com`,
/// then the role mailboxes are appended at the crawled domain.
pub fn generate_candidates(name: &NameParts, domain: &str) -> Vec<String> {
    let suffixes = [domain, "google.com"];
    let mut candidates: Vec<String> = generate_local_parts(name)
        .iter()
        .flat_map(|local| suffixes.iter().map(move |suffix| format!("{}@{}", local, suffix)))
        .collect();

    candidates.extend(ROLE_MAILBOXES.iter().map(|role| format!("{}@{}", role, domain)));
    candidates
}
