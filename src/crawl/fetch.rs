// src/crawl/fetch.rs
// =============================================================================
// Fetching pages over HTTP.
//
// The frontier only talks to the PageFetcher trait, so the crawl logic can
// be exercised against an in-memory site in tests while the real binary
// uses HttpFetcher (reqwest).
//
// A fetch either returns a FetchedPage or a FetchError. The frontier treats
// every FetchError the same way: skip the page and keep crawling.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE, LAST_MODIFIED};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::CrawlConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What the crawler keeps from a successful response
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Empty for anything that isn't HTML
    pub body: String,
    pub content_type: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FetchedPage {
    /// text/html or application/xhtml+xml, with or without a charset
    pub fn is_html(&self) -> bool {
        is_html_content_type(&self.content_type)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5).min(config.timeout))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/html,*/*")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let headers = response.headers();
        let content_type = header_str(headers, CONTENT_TYPE).unwrap_or_default();
        let last_modified = header_str(headers, LAST_MODIFIED).and_then(|v| parse_http_date(&v));

        // Non-HTML pages are still recorded, but we never need their bytes
        let body = if is_html_content_type(&content_type) {
            response.text().await.map_err(classify)?
        } else {
            String::new()
        };

        Ok(FetchedPage {
            body,
            content_type,
            last_modified,
        })
    }
}

fn header_str(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(error)
    }
}

pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.trim().to_ascii_lowercase();
    lower.starts_with("text/html") || lower.starts_with("application/xhtml+xml")
}

/// Parses a Last-Modified value such as "Wed, 21 Oct 2015 07:28:00 GMT"
///
/// Anything we can't read is treated as if the header were missing.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
