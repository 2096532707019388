// src/crawl/mod.rs
// =============================================================================
// This module handles crawling one website.
//
// Submodules:
// - canonical: turns any link into its canonical same-origin form (or drops it)
// - links: finds <a href> links in an HTML page
// - fetch: the PageFetcher trait and its reqwest implementation
// - frontier: the queue + visited set that drive the crawl
//
// Only `crawl()` does I/O (through the fetcher). Everything else here is
// plain synchronous code that is easy to test on its own.
// =============================================================================

mod canonical;
mod fetch;
mod frontier;
mod links;

pub use fetch::HttpFetcher;
pub use frontier::{crawl, CancellationFlag, CrawlOutcome, PageRecord};
