// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: breadth-first traversal of one website.
//
// How it works:
// 1. Start with the canonical seed URL in the pending queue
// 2. Pop the head of the queue; skip it if we've already visited it
// 3. Mark it visited *before* fetching, so it can never be fetched twice
// 4. Fetch it; on failure log a warning and move on
// 5. Record the page, and if it's HTML, canonicalize its links and queue
//    the ones we haven't seen
// 6. Sleep for the configured delay, then go again
//
// The crawl stops when the queue is empty, the page cap is reached, or the
// cancellation flag is raised (Ctrl-C in the CLI).
//
// With concurrency > 1 step 2-4 happen for a small batch at once. The whole
// batch is marked visited before any request goes out, and results are
// handled in the order the URLs left the queue, so the output is the same
// as a sequential crawl of that batch.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

use super::canonical::Canonicalizer;
use super::fetch::{FetchedPage, PageFetcher};
use super::links::extract_links;
use crate::config::CrawlConfig;

/// One crawled page, created when the page is first fetched successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub location: String,
    pub last_modified: DateTime<Utc>,
}

/// Shared stop switch, checked at the top of every crawl step
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a finished (or interrupted) crawl hands back
#[derive(Debug)]
pub struct CrawlOutcome {
    pub pages: Vec<PageRecord>,
    /// Bare origin page, e.g. "https://example.com/"
    pub root_url: String,
    pub fetch_failures: usize,
    pub cancelled: bool,
}

pub struct Frontier {
    canonicalizer: Canonicalizer,
    pending: VecDeque<String>,
    // Mirrors `pending` so we never queue the same URL twice
    pending_set: HashSet<String>,
    visited: HashSet<String>,
    pages: Vec<PageRecord>,
    max_pages: Option<usize>,
}

impl Frontier {
    /// `seed` must already be canonical
    pub fn new(canonicalizer: Canonicalizer, seed: String, max_pages: Option<usize>) -> Self {
        let mut frontier = Self {
            canonicalizer,
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            visited: HashSet::new(),
            pages: Vec::new(),
            max_pages,
        };
        frontier.enqueue(seed);
        frontier
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty() || self.remaining_capacity() == 0
    }

    fn remaining_capacity(&self) -> usize {
        match self.max_pages {
            Some(max) => max.saturating_sub(self.pages.len()),
            None => usize::MAX,
        }
    }

    /// Takes up to `size` unvisited URLs off the queue and marks them visited
    ///
    /// Never hands out more URLs than the page cap still allows.
    pub fn next_batch(&mut self, size: usize) -> Vec<String> {
        let limit = size.min(self.remaining_capacity());
        let mut batch = Vec::with_capacity(limit);

        while batch.len() < limit {
            let Some(url) = self.pending.pop_front() else {
                break;
            };
            self.pending_set.remove(&url);

            if !self.visited.insert(url.clone()) {
                continue;
            }
            batch.push(url);
        }

        batch
    }

    /// Records a fetched page and queues whatever new links it has
    pub fn record(&mut self, url: String, page: FetchedPage) {
        if page.is_html() {
            self.enqueue_links_from(&url, &page.body);
        }

        self.pages.push(PageRecord {
            location: url,
            last_modified: page.last_modified.unwrap_or_else(Utc::now),
        });
    }

    fn enqueue_links_from(&mut self, url: &str, body: &str) {
        let Ok(base) = Url::parse(url) else {
            return;
        };

        for link in extract_links(body, url) {
            match self.canonicalizer.canonicalize(&link, &base) {
                Some(canonical) => self.enqueue(canonical),
                None => tracing::debug!(link = %link, "skipping link"),
            }
        }
    }

    fn enqueue(&mut self, url: String) {
        if self.visited.contains(&url) || self.pending_set.contains(&url) {
            return;
        }
        self.pending_set.insert(url.clone());
        self.pending.push_back(url);
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<PageRecord> {
        self.pages
    }
}

// Crawls the site at config.seed_url
//
// Parameters:
//   fetcher: where pages come from (HttpFetcher in the binary)
//   config: seed, page cap, delay, concurrency, skipped extensions
//   cancel: checked before every step; raising it ends the crawl early
//
// Returns: every page recorded, plus failure and cancellation info.
// Only an unusable seed URL is an error; a page that fails to fetch is
// logged, counted and skipped.
pub async fn crawl<F>(fetcher: &F, config: &CrawlConfig, cancel: &CancellationFlag) -> Result<CrawlOutcome>
where
    F: PageFetcher + ?Sized,
{
    let seed = Url::parse(&config.seed_url)
        .with_context(|| format!("Invalid seed URL '{}'", config.seed_url))?;
    let canonicalizer = Canonicalizer::for_seed(&seed, &config.skip_extensions)
        .ok_or_else(|| anyhow!("Seed URL has no web origin: {}", config.seed_url))?;
    let seed = canonicalizer
        .canonicalize(seed.as_str(), &seed)
        .ok_or_else(|| anyhow!("Seed URL is not a crawlable page: {}", config.seed_url))?;

    let root_url = canonicalizer.root_url();
    let batch_size = config.concurrency.max(1);
    let mut frontier = Frontier::new(canonicalizer, seed, config.max_pages);
    let mut fetch_failures = 0;
    let mut cancelled = false;

    tracing::info!(seed = %config.seed_url, max_pages = ?config.max_pages, "starting crawl");

    while !frontier.is_done() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let batch = frontier.next_batch(batch_size);
        if batch.is_empty() {
            continue;
        }

        let results: Vec<_> = stream::iter(batch)
            .map(|url| async move {
                let result = fetcher.fetch(&url).await;
                (url, result)
            })
            .buffered(batch_size)
            .collect()
            .await;

        for (url, result) in results {
            match result {
                Ok(page) => {
                    tracing::info!(url = %url, content_type = %page.content_type, "crawled");
                    frontier.record(url, page);
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "skipping page");
                    fetch_failures += 1;
                }
            }
        }

        // Polite crawling: pause before the next request goes out
        if !frontier.is_done() && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
    }

    tracing::info!(
        pages = frontier.pages().len(),
        visited = frontier.visited_count(),
        fetch_failures,
        cancelled,
        "crawl finished"
    );

    Ok(CrawlOutcome {
        pages: frontier.into_pages(),
        root_url,
        fetch_failures,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::FetchError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    // An in-memory website: URL -> page, or URL -> HTTP status for failures
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, Result<FetchedPage, u16>>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn html(mut self, url: &str, links: &[&str]) -> Self {
            let body = links
                .iter()
                .map(|href| format!(r#"<a href="{}">link</a>"#, href))
                .collect::<Vec<_>>()
                .join("\n");
            let page = FetchedPage {
                body: format!("<html><body>{}</body></html>", body),
                content_type: "text/html; charset=utf-8".into(),
                last_modified: None,
            };
            self.pages.insert(url.to_string(), Ok(page));
            self
        }

        fn page(mut self, url: &str, page: FetchedPage) -> Self {
            self.pages.insert(url.to_string(), Ok(page));
            self
        }

        fn failing(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(status)) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn config(seed: &str) -> CrawlConfig {
        CrawlConfig {
            seed_url: seed.to_string(),
            delay: Duration::ZERO,
            ..CrawlConfig::default()
        }
    }

    fn locations(outcome: &CrawlOutcome) -> Vec<&str> {
        outcome.pages.iter().map(|p| p.location.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetches_each_page_once() {
        let site = FakeSite::default()
            .html("https://x.test/a", &["/b", "/b", "/a"])
            .html("https://x.test/b", &["/a", "https://x.test/a#top"]);

        let outcome = crawl(&site, &config("https://x.test/a"), &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(site.fetched(), vec!["https://x.test/a", "https://x.test/b"]);
        assert_eq!(locations(&outcome), vec!["https://x.test/a", "https://x.test/b"]);
        assert_eq!(outcome.fetch_failures, 0);
        assert!(!outcome.cancelled);
    }

    #[tokio::test]
    async fn test_failed_page_does_not_stop_crawl() {
        let site = FakeSite::default()
            .html("https://x.test/", &["/b", "/c"])
            .failing("https://x.test/b", 500)
            .html("https://x.test/c", &["/d"])
            .html("https://x.test/d", &[]);

        let outcome = crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(
            locations(&outcome),
            vec!["https://x.test/", "https://x.test/c", "https://x.test/d"]
        );
        assert_eq!(outcome.fetch_failures, 1);
        assert_eq!(site.fetched().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_page_is_not_retried() {
        let site = FakeSite::default()
            .html("https://x.test/", &["/b", "/c"])
            .failing("https://x.test/b", 503)
            .html("https://x.test/c", &["/b"]);

        crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();

        let fetched = site.fetched();
        assert_eq!(fetched.iter().filter(|u| *u == "https://x.test/b").count(), 1);
    }

    #[tokio::test]
    async fn test_stops_at_page_cap() {
        let site = FakeSite::default()
            .html("https://x.test/", &["/1"])
            .html("https://x.test/1", &["/2"])
            .html("https://x.test/2", &["/3"])
            .html("https://x.test/3", &[]);

        let config = CrawlConfig {
            max_pages: Some(2),
            ..config("https://x.test/")
        };
        let outcome = crawl(&site, &config, &CancellationFlag::default()).await.unwrap();

        assert_eq!(locations(&outcome), vec!["https://x.test/", "https://x.test/1"]);
        assert_eq!(site.fetched().len(), 2);
    }

    #[tokio::test]
    async fn test_off_site_and_asset_links_are_not_fetched() {
        let site = FakeSite::default()
            .html(
                "https://x.test/",
                &["/about", "https://other.test/", "/logo.png", "mailto:a@x.test"],
            )
            .html("https://x.test/about", &[]);

        crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(site.fetched(), vec!["https://x.test/", "https://x.test/about"]);
    }

    #[tokio::test]
    async fn test_non_html_page_is_recorded_but_not_crawled() {
        let modified = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let site = FakeSite::default()
            .html("https://x.test/", &["/feed"])
            .page(
                "https://x.test/feed",
                FetchedPage {
                    body: r#"<a href="/hidden">never followed</a>"#.into(),
                    content_type: "application/rss+xml".into(),
                    last_modified: Some(modified),
                },
            );

        let outcome = crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(locations(&outcome), vec!["https://x.test/", "https://x.test/feed"]);
        assert_eq!(outcome.pages[1].last_modified, modified);
        assert!(!site.fetched().contains(&"https://x.test/hidden".to_string()));
    }

    #[tokio::test]
    async fn test_missing_last_modified_falls_back_to_now() {
        let site = FakeSite::default().html("https://x.test/", &[]);
        let before = Utc::now();

        let outcome = crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();

        assert!(outcome.pages[0].last_modified >= before);
        assert!(outcome.pages[0].last_modified <= Utc::now());
    }

    #[tokio::test]
    async fn test_seed_is_canonicalized() {
        let site = FakeSite::default().html("https://x.test/", &[]);

        let outcome = crawl(
            &site,
            &config("https://x.test//index.html?utm=1#top"),
            &CancellationFlag::default(),
        )
        .await
        .unwrap();

        assert_eq!(locations(&outcome), vec!["https://x.test/"]);
        assert_eq!(outcome.root_url, "https://x.test/");
    }

    #[tokio::test]
    async fn test_invalid_seed_is_an_error() {
        let site = FakeSite::default();
        let cancel = CancellationFlag::default();

        assert!(crawl(&site, &config("not a url"), &cancel).await.is_err());
        assert!(crawl(&site, &config("mailto:a@x.test"), &cancel).await.is_err());
        assert!(crawl(&site, &config("https://x.test/report.pdf"), &cancel).await.is_err());
        assert!(site.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_crawl_fetches_nothing() {
        let site = FakeSite::default().html("https://x.test/", &["/a"]);
        let cancel = CancellationFlag::default();
        cancel.cancel();

        let outcome = crawl(&site, &config("https://x.test/"), &cancel).await.unwrap();

        assert!(outcome.cancelled);
        assert!(outcome.pages.is_empty());
        assert!(site.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_crawl_keeps_invariants() {
        let site = FakeSite::default()
            .html("https://x.test/", &["/a", "/b", "/c", "/a"])
            .html("https://x.test/a", &["/b", "/c", "/"])
            .html("https://x.test/b", &["/a", "/d"])
            .html("https://x.test/c", &["/d"])
            .html("https://x.test/d", &["/"]);

        let config = CrawlConfig {
            concurrency: 3,
            ..config("https://x.test/")
        };
        let outcome = crawl(&site, &config, &CancellationFlag::default()).await.unwrap();

        let mut fetched = site.fetched();
        fetched.sort();
        let before = fetched.len();
        fetched.dedup();
        assert_eq!(before, fetched.len());
        assert_eq!(fetched.len(), 5);
        // Results are processed in dequeue order regardless of completion order
        assert_eq!(
            locations(&outcome),
            vec![
                "https://x.test/",
                "https://x.test/a",
                "https://x.test/b",
                "https://x.test/c",
                "https://x.test/d",
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_batch_respects_page_cap() {
        let site = FakeSite::default()
            .html("https://x.test/", &["/a", "/b", "/c", "/d"])
            .html("https://x.test/a", &[])
            .html("https://x.test/b", &[])
            .html("https://x.test/c", &[])
            .html("https://x.test/d", &[]);

        let config = CrawlConfig {
            concurrency: 4,
            max_pages: Some(3),
            ..config("https://x.test/")
        };
        let outcome = crawl(&site, &config, &CancellationFlag::default()).await.unwrap();

        assert_eq!(outcome.pages.len(), 3);
        assert_eq!(site.fetched().len(), 3);
    }

    #[tokio::test]
    async fn test_end_to_end_sitemap() {
        let site = FakeSite::default()
            .html(
                "https://x.test/",
                &["/about", "/about", "https://elsewhere.test/", "/img/logo.png"],
            )
            .html("https://x.test/about", &[]);

        let outcome = crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();
        let xml = crate::sitemap::build(&outcome.pages).unwrap();

        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains("<loc>https://x.test/</loc>"));
        assert!(xml.contains("<loc>https://x.test/about</loc>"));
        assert!(!xml.contains("elsewhere.test"));
        assert!(!xml.contains("logo.png"));
    }

    fn chain_site() -> FakeSite {
        FakeSite::default()
            .html("https://x.test/", &["/1"])
            .html("https://x.test/1", &["/2"])
            .html("https://x.test/2", &[])
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_between_fetches() {
        let site = chain_site();
        let config = CrawlConfig {
            delay: Duration::from_millis(150),
            ..config("https://x.test/")
        };

        let start = tokio::time::Instant::now();
        let outcome = crawl(&site, &config, &CancellationFlag::default()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(outcome.pages.len(), 3);
        // Two pauses between three fetches, none after the last one
        assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(450), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_after_failed_fetch_too() {
        let site = FakeSite::default()
            .html("https://x.test/", &["/b", "/c"])
            .failing("https://x.test/b", 500)
            .html("https://x.test/c", &[]);
        let config = CrawlConfig {
            delay: Duration::from_millis(100),
            ..config("https://x.test/")
        };

        let start = tokio::time::Instant::now();
        crawl(&site, &config, &CancellationFlag::default()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(site.fetched().len(), 3);
        assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let site = chain_site();

        let start = tokio::time::Instant::now();
        crawl(&site, &config("https://x.test/"), &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page_crawl_does_not_sleep() {
        let site = FakeSite::default().html("https://x.test/", &[]);
        let config = CrawlConfig {
            delay: Duration::from_secs(5),
            ..config("https://x.test/")
        };

        let start = tokio::time::Instant::now();
        crawl(&site, &config, &CancellationFlag::default()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_next_batch_skips_visited_and_dedups_pending() {
        let seed = Url::parse("https://x.test/").unwrap();
        let canon = Canonicalizer::for_seed(&seed, &[]).unwrap();
        let mut frontier = Frontier::new(canon, "https://x.test/".into(), None);

        assert_eq!(frontier.next_batch(5), vec!["https://x.test/"]);
        frontier.record(
            "https://x.test/".into(),
            FetchedPage {
                body: r#"<a href="/">home</a><a href="/a">a</a><a href="/a">a</a>"#.into(),
                content_type: "text/html".into(),
                last_modified: None,
            },
        );

        assert_eq!(frontier.next_batch(5), vec!["https://x.test/a"]);
        assert!(frontier.is_done());
        assert_eq!(frontier.visited_count(), 2);
        assert_eq!(frontier.pages().len(), 1);
    }
}
