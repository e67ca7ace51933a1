//! Crawler module for prospect discovery
//!
//! This module contains the crawling pipeline, including:
//! - HTTP fetching with a per-response log line
//! - Request scheduling with a concurrency limit and deadlines
//! - Response routing and page extraction
//! - Social profile and owner name detection
//! - Crawl orchestration for one website and for batches

mod batch;
mod coordinator;
mod extractor;
mod fetcher;
mod names;
mod parser;
mod router;
mod scheduler;
mod session;
mod social;

pub use batch::{crawl_batch, BatchReport, CrawlDetail, SAVE_GRACE};
pub use coordinator::{
    CrawlInput, CrawlResponse, CrawlWebsite, Crawler, SharedStorage, SocialNetworks,
    GUESSED_EMAIL_CONFIDENCE,
};
pub use extractor::{PageExtractor, SCRAPED_EMAIL_CONFIDENCE};
pub use fetcher::{
    build_http_client, fetch, is_html_content_type, FetchError, FetchMethod, FetchedResponse,
    Request,
};
pub use names::{find_name, FoundName};
pub use parser::{is_image_link, mailto_address, parse_page, resolve_link, standardize_spaces, ParsedPage};
pub use router::{RouteAction, Router};
pub use scheduler::{
    CrawlEnd, CrawlStats, QueueError, QueueHandle, ResponseHandler, Scheduler, Termination,
};
pub use session::{CrawlSession, VisitedSet};
pub use social::{detect_social, similarity, SocialMatch, SocialStrategy};
