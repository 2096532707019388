// src/sitemap/mod.rs
// =============================================================================
// This module turns the pages we crawled into sitemap.xml.
//
// - heuristics: changefreq / priority guesses from the URL path
// - builder: ordering, XML rendering and writing the file
// =============================================================================

mod builder;
mod heuristics;

pub use builder::{build, entries, render, write_sitemap, SitemapEntry};
