//! Response routing
//!
//! An ordered list of rules evaluated top to bottom against a fetched
//! response. The first matching rule decides what happens to it; responses
//! matching no rule are dropped.

use crate::crawler::fetcher::FetchedResponse;
use crate::url::extract_domain;
use url::Url;

/// What to do with a fetched response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Log the transport or status error and drop the URL
    LogError,
    /// Run the page extractor on the HTML body
    ExtractPage,
    /// Re-issue the same URL as a GET
    ReissueAsGet,
}

type Predicate = Box<dyn Fn(&FetchedResponse) -> bool + Send + Sync>;

struct Rule {
    name: &'static str,
    predicate: Predicate,
    action: RouteAction,
}

/// Dispatch table for fetched responses
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule; earlier rules take precedence
    pub fn rule<F>(mut self, name: &'static str, predicate: F, action: RouteAction) -> Self
    where
        F: Fn(&FetchedResponse) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            predicate: Box::new(predicate),
            action,
        });
        self
    }

    /// Builds the crawl routing table for a seed
    ///
    /// 1. errors are logged
    /// 2. HTML GET responses are extracted
    /// 3. HTML HEAD responses on the seed's host are fetched again with GET
    pub fn for_seed(seed: &Url) -> Self {
        let seed_host = extract_domain(seed);

        Self::new()
            .rule(
                "error",
                |response| matches!(response, FetchedResponse::Error { .. }),
                RouteAction::LogError,
            )
            .rule(
                "get-html",
                |response| matches!(response, FetchedResponse::Get { .. }) && response.is_html(),
                RouteAction::ExtractPage,
            )
            .rule(
                "head-html-same-host",
                move |response| {
                    matches!(response, FetchedResponse::Head { .. })
                        && response.is_html()
                        && host_of(response.url()) == seed_host
                },
                RouteAction::ReissueAsGet,
            )
    }

    /// Returns the action of the first matching rule
    pub fn route(&self, response: &FetchedResponse) -> Option<RouteAction> {
        let rule = self.rules.iter().find(|rule| (rule.predicate)(response))?;
        tracing::trace!("Routed {} via rule '{}'", response.url(), rule.name);
        Some(rule.action)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchError, Request};

    fn router() -> Router {
        Router::for_seed(&Url::parse("https://example.com/").unwrap())
    }

    fn get(url: &str, content_type: &str) -> FetchedResponse {
        FetchedResponse::Get {
            url: url.to_string(),
            content_type: content_type.to_string(),
            body: Some(String::new()),
        }
    }

    fn head(url: &str, content_type: &str) -> FetchedResponse {
        FetchedResponse::Head {
            url: url.to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn test_errors_route_to_log() {
        let response = FetchedResponse::Error {
            request: Request::get("https://example.com/x"),
            error: FetchError::Timeout,
        };
        assert_eq!(router().route(&response), Some(RouteAction::LogError));
    }

    #[test]
    fn test_html_get_routes_to_extractor() {
        let response = get("https://example.com/about", "text/html; charset=utf-8");
        assert_eq!(router().route(&response), Some(RouteAction::ExtractPage));

        // GET is extracted whatever the host
        let response = get("https://other.org/", "text/html");
        assert_eq!(router().route(&response), Some(RouteAction::ExtractPage));
    }

    #[test]
    fn test_non_html_get_is_dropped() {
        let response = get("https://example.com/file.pdf", "application/pdf");
        assert_eq!(router().route(&response), None);
    }

    #[test]
    fn test_head_same_host_reissues_get() {
        let response = head("https://EXAMPLE.com/contact", "text/html");
        assert_eq!(router().route(&response), Some(RouteAction::ReissueAsGet));
    }

    #[test]
    fn test_head_other_host_is_dropped() {
        let response = head("https://cdn.example.com/contact", "text/html");
        assert_eq!(router().route(&response), None);
    }

    #[test]
    fn test_head_non_html_is_dropped() {
        let response = head("https://example.com/logo.png", "image/png");
        assert_eq!(router().route(&response), None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let router = Router::new()
            .rule("always", |_| true, RouteAction::LogError)
            .rule("also-always", |_| true, RouteAction::ExtractPage);
        assert_eq!(
            router.route(&get("https://example.com/", "text/html")),
            Some(RouteAction::LogError)
        );
    }

    #[test]
    fn test_empty_router_drops_everything() {
        assert_eq!(Router::default().route(&get("https://example.com/", "text/html")), None);
    }
}
