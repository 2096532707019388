// src/sitemap/builder.rs
// =============================================================================
// Turns crawled pages into a sitemaps.org XML document.
//
// Output looks like:
//
//   <?xml version="1.0" encoding="UTF-8"?>
//   <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//     <url>
//       <loc>https://example.com/</loc>
//       <lastmod>2024-01-01T00:00:00.000Z</lastmod>
//       <changefreq>weekly</changefreq>
//       <priority>1.0</priority>
//     </url>
//   </urlset>
//
// The home page always comes first, everything else is sorted by URL.
// =============================================================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::Path;
use thiserror::Error;
use url::Url;

use super::heuristics::{change_frequency, priority, ChangeFrequency};
use crate::crawl::PageRecord;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("cannot serialize sitemap entry: {0}")]
    Serialization(String),
    #[error("cannot write sitemap: {0}")]
    Io(#[from] std::io::Error),
}

/// One <url> element, derived from a PageRecord
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: ChangeFrequency,
    pub priority: f32,
}

impl SitemapEntry {
    fn from_page(page: &PageRecord) -> Result<Self, SitemapError> {
        let url = Url::parse(&page.location).map_err(|e| {
            SitemapError::Serialization(format!("invalid location '{}': {}", page.location, e))
        })?;
        let path = match url.path() {
            "" => "/",
            path => path,
        };

        Ok(Self {
            loc: page.location.clone(),
            lastmod: format_lastmod(&page.last_modified),
            changefreq: change_frequency(path),
            priority: priority(path),
        })
    }
}

/// e.g. 2015-10-21T07:28:00.000Z
pub fn format_lastmod(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Derives and orders the sitemap entries for `pages`
pub fn entries(pages: &[PageRecord]) -> Result<Vec<SitemapEntry>, SitemapError> {
    let mut entries = pages
        .iter()
        .map(SitemapEntry::from_page)
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by(|a, b| {
        (!is_site_root(&a.loc), &a.loc).cmp(&(!is_site_root(&b.loc), &b.loc))
    });

    Ok(entries)
}

// The bare origin, e.g. "https://example.com/"
fn is_site_root(loc: &str) -> bool {
    Url::parse(loc).is_ok_and(|url| url.path() == "/")
}

// Renders already-ordered entries as the sitemap document
//
// Parameters:
//   entries: the <url> entries, in the order they should appear
//
// Returns: the complete XML text, declaration and trailing newline included
pub fn render(entries: &[SitemapEntry]) -> Result<String, SitemapError> {
    let mut xml = String::new();
    write_document(&mut xml, entries)
        .map_err(|e| SitemapError::Serialization(format!("formatting failed: {}", e)))?;
    Ok(xml)
}

fn write_document(xml: &mut String, entries: &[SitemapEntry]) -> fmt::Result {
    writeln!(xml, "{}", XML_DECLARATION)?;
    writeln!(xml, r#"<urlset xmlns="{}">"#, SITEMAP_NAMESPACE)?;

    for entry in entries {
        writeln!(xml, "  <url>")?;
        writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc))?;
        writeln!(xml, "    <lastmod>{}</lastmod>", entry.lastmod)?;
        writeln!(xml, "    <changefreq>{}</changefreq>", entry.changefreq)?;
        writeln!(xml, "    <priority>{:.1}</priority>", entry.priority)?;
        writeln!(xml, "  </url>")?;
    }

    writeln!(xml, "</urlset>")
}

// Builds the complete sitemap document for `pages`
//
// Parameters:
//   pages: every page the crawl recorded, in any order
//
// Returns: the XML document, or SitemapError::Serialization if a page
// location is not a valid URL
pub fn build(pages: &[PageRecord]) -> Result<String, SitemapError> {
    render(&entries(pages)?)
}

/// Writes the document as UTF-8, replacing any existing file
pub fn write_sitemap(path: &Path, xml: &str) -> Result<(), SitemapError> {
    std::fs::write(path, xml.as_bytes())?;
    Ok(())
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
