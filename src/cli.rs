// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is only one thing this tool does, so there are no subcommands:
//
//   site-mapper https://example.com --max-pages 500 --output public/sitemap.xml
//
// Cli::to_config() turns the parsed flags into the CrawlConfig the crawler
// works with.
// =============================================================================

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    CrawlConfig, DEFAULT_DELAY_MS, DEFAULT_SEED_URL, DEFAULT_SKIP_EXTENSIONS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};

#[derive(Parser, Debug)]
#[command(
    name = "site-mapper",
    version,
    about = "Crawl a website and write a sitemap.xml",
    long_about = "site-mapper starts from one URL, follows every same-site <a href> link it can find \
                  and writes a sitemaps.org sitemap listing each page it reached."
)]
pub struct Cli {
    /// Page to start crawling from; only pages on the same origin are followed
    #[arg(default_value = DEFAULT_SEED_URL)]
    pub seed_url: String,

    /// Stop after this many pages have been recorded (default: no limit)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Pause between requests, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// File extensions that are never pages (comma separated, e.g. pdf,png,zip)
    #[arg(long = "skip-ext", value_delimiter = ',', default_values_t = default_skip_extensions())]
    pub skip_extensions: Vec<String>,

    /// How many requests may be in flight at once
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Where to write the sitemap
    #[arg(long, short, default_value = "sitemap.xml")]
    pub output: PathBuf,

    /// Print a JSON crawl report instead of the summary
    #[arg(long)]
    pub json: bool,
}

fn default_skip_extensions() -> Vec<String> {
    DEFAULT_SKIP_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

impl Cli {
    pub fn to_config(&self) -> Result<CrawlConfig> {
        CrawlConfig {
            seed_url: self.seed_url.clone(),
            max_pages: self.max_pages,
            delay: Duration::from_millis(self.delay_ms),
            user_agent: self.user_agent.clone(),
            skip_extensions: self.skip_extensions.clone(),
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout_secs),
        }
        .validated()
    }
}
