use url::Url;

/// Second-level labels that behave like public suffixes (`co.uk`, `com.au`, ...)
const SECOND_LEVEL_SUFFIXES: &[&str] = &["co", "com", "net", "org", "gov", "edu", "ac", "or", "ne"];

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use prospector::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a host name to its registrable domain
///
/// Subdomains (including `www.`) are stripped. When the last two labels look
/// like a country-code second-level suffix (`example.co.uk`), three labels are
/// kept. IP addresses and single-label hosts are returned unchanged.
///
/// # Arguments
///
/// * `host` - Host name, any case
///
/// # Returns
///
/// The lowercase registrable domain
///
/// # Examples
///
/// ```
/// use prospector::url::registrable_domain;
///
/// assert_eq!(registrable_domain("www.Example.com"), "example.com");
/// assert_eq!(registrable_domain("shop.example.co.uk"), "example.co.uk");
/// assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    if host.parse::<std::net::IpAddr>().is_ok() || host.starts_with('[') {
        return host;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }

    let n = labels.len();
    let tld = labels[n - 1];
    let second = labels[n - 2];
    let keep = if tld.len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&second) {
        3
    } else {
        2
    };

    labels[n - keep..].join(".")
}

/// Returns the brand part of a host: the first label of its registrable domain
///
/// `www.example.com` gives `example`, `example.co.uk` gives `example`.
pub fn domain_name_without_extension(host: &str) -> String {
    let domain = registrable_domain(host);
    match domain.split('.').next() {
        Some(first) if domain.parse::<std::net::IpAddr>().is_err() => first.to_string(),
        _ => domain,
    }
}
