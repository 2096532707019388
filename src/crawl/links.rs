// src/crawl/links.rs
// =============================================================================
// Pulls candidate links out of an HTML page.
//
// We use the `scraper` crate (built on html5ever), so broken markup,
// attribute order and stray whitespace inside tags are all handled for us.
// Only <a href> counts; images, scripts and stylesheets are not pages.
//
// The result is every href in document order, resolved to an absolute URL,
// duplicates included. Deciding what is on-site and what has been seen
// before is the frontier's job, not ours.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Schemes that can never point at a page
const SKIPPED_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

// Extracts every anchor href from an HTML page
//
// Parameters:
//   html: the page content
//   base_url: the page's own URL, used to resolve relative links
//
// Returns: absolute URLs in document order, duplicates included
//
// Example:
//   html = "<a href='/docs'>Docs</a><a href='mailto:me@x.com'>Mail</a>"
//   base_url = "https://example.com/page"
//   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(base_url, error = %e, "cannot resolve links against invalid base URL");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);

    // The selector is a constant, so parsing it can only fail on a typo here
    let selector = Selector::parse("a[href]").expect("static selector is valid");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !has_skipped_scheme(href))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}

fn has_skipped_scheme(href: &str) -> bool {
    SKIPPED_SCHEMES.iter().any(|scheme| {
        href.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
