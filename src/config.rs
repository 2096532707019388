// src/config.rs
// =============================================================================
// Crawl configuration.
//
// Everything the crawl core needs to know about a run lives in CrawlConfig:
// where to start, how many pages to record, how long to wait between
// fetches, which user agent to send and which file extensions never count
// as pages. The CLI builds one of these; tests build them by hand.
// =============================================================================

use anyhow::{bail, Result};
use std::time::Duration;

/// Seed used when no URL is given on the command line
pub const DEFAULT_SEED_URL: &str = "https://www.baumechemical.com/";

/// User agent sent with every fetch unless overridden
pub const DEFAULT_USER_AGENT: &str = "SiteMapperBot/1.0 (+https://github.com/site-mapper)";

/// Pause between fetches, in milliseconds
pub const DEFAULT_DELAY_MS: u64 = 150;

/// Per-request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Extensions that are never treated as HTML pages
pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "js", "css", "json", "txt", "zip",
    "rar", "7z", "mp4", "mp3", "wav", "woff", "woff2", "ttf", "eot",
];

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: String,
    /// None means "crawl until the queue runs dry"
    pub max_pages: Option<usize>,
    pub delay: Duration,
    pub user_agent: String,
    /// Lower-case, without the leading dot
    pub skip_extensions: Vec<String>,
    /// How many fetches may be in flight at once (1 = strictly sequential)
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: DEFAULT_SEED_URL.to_string(),
            max_pages: None,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            skip_extensions: DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            concurrency: 1,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CrawlConfig {
    /// Checks the values that clap can't check for us and normalizes the
    /// extension list (".PDF" and "pdf" mean the same thing)
    pub fn validated(mut self) -> Result<Self> {
        if self.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        if self.timeout.is_zero() {
            bail!("--timeout-secs must be at least 1");
        }

        self.skip_extensions = normalize_extensions(&self.skip_extensions);
        Ok(self)
    }
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}
