//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - HEAD requests to check Content-Type cheaply
//! - GET requests to fetch page content
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client, Method};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// HTTP method of a queued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    Head,
}

impl FetchMethod {
    fn as_reqwest(&self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Head => Method::HEAD,
        }
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Head => f.write_str("HEAD"),
        }
    }
}

/// A request waiting in the crawl queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: FetchMethod,
    pub url: String,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: FetchMethod::Get,
            url: url.into(),
        }
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: FetchMethod::Head,
            url: url.into(),
        }
    }
}

/// Why a fetch produced no usable response
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// A completed fetch, tagged by method
#[derive(Debug, Clone)]
pub enum FetchedResponse {
    Get {
        /// Final URL after redirects
        url: String,
        content_type: String,
        /// Body, read only for HTML responses
        body: Option<String>,
    },
    Head {
        url: String,
        content_type: String,
    },
    Error {
        request: Request,
        error: FetchError,
    },
}

impl FetchedResponse {
    /// URL the response relates to
    pub fn url(&self) -> &str {
        match self {
            Self::Get { url, .. } | Self::Head { url, .. } => url,
            Self::Error { request, .. } => &request.url,
        }
    }

    /// Content type of a successful response
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Get { content_type, .. } | Self::Head { content_type, .. } => Some(content_type),
            Self::Error { .. } => None,
        }
    }

    /// Returns true if this is a successful response with an HTML content type
    pub fn is_html(&self) -> bool {
        self.content_type().map(is_html_content_type).unwrap_or(false)
    }
}

/// Returns true for `text/html` content types, parameters ignored
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
        .unwrap_or(false)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings (request timeout)
///
/// # Example
///
/// ```no_run
/// use prospector::config::{CrawlerConfig, UserAgentConfig};
/// use prospector::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "Prospector".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(agent)
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.request_timeout().min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one queued request
///
/// Non-2xx statuses are reported as errors. For GET responses the body is
/// only downloaded when the content type is HTML.
pub async fn fetch(client: &Client, request: &Request) -> FetchedResponse {
    let response = match client
        .request(request.method.as_reqwest(), &request.url)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return FetchedResponse::Error {
                request: request.clone(),
                error: e.into(),
            }
        }
    };

    let status = response.status();
    let url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    tracing::info!(
        status = status.as_u16(),
        method = %request.method,
        url = %url,
        content_type = %content_type,
        "fetch"
    );

    if !status.is_success() {
        return FetchedResponse::Error {
            request: request.clone(),
            error: FetchError::Status(status.as_u16()),
        };
    }

    match request.method {
        FetchMethod::Head => FetchedResponse::Head { url, content_type },
        FetchMethod::Get => {
            if !is_html_content_type(&content_type) {
                return FetchedResponse::Get {
                    url,
                    content_type,
                    body: None,
                };
            }
            match response.text().await {
                Ok(body) => FetchedResponse::Get {
                    url,
                    content_type,
                    body: Some(body),
                },
                Err(e) => FetchedResponse::Error {
                    request: request.clone(),
                    error: e.into(),
                },
            }
        }
    }
}
