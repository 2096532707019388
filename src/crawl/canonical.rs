// src/crawl/canonical.rs
// =============================================================================
// URL canonicalization.
//
// Every link the crawler finds goes through Canonicalizer::canonicalize()
// before it is allowed anywhere near the queue. Two links that canonicalize
// to the same string are the same page, so this is what keeps the crawl
// from fetching "/about", "/about#team" and "/about?ref=nav" three times.
//
// Rules, in order:
// 1. Resolve the link against its base (relative, protocol-relative, absolute)
// 2. Reject anything outside the crawl origin (scheme + host + port)
// 3. Drop the fragment and the whole query string
// 4. Fold a trailing /index.htm or /index.html (any case) into /
// 5. Collapse runs of slashes in the path
// 6. Reject paths ending in a non-page extension (case-insensitive)
//
// A rejected link is not an error, it simply yields None.
// =============================================================================

use url::{Origin, Url};

#[derive(Debug, Clone)]
pub struct Canonicalizer {
    origin: Origin,
    skip_extensions: Vec<String>,
}

impl Canonicalizer {
    // Builds a canonicalizer bounded to the origin of the seed URL
    //
    // Parameters:
    //   seed: the URL the crawl starts from
    //   skip_extensions: extensions (without the dot) that are never pages
    //
    // Returns: None when the seed has no web origin ("mailto:", "file:", ...)
    pub fn for_seed(seed: &Url, skip_extensions: &[String]) -> Option<Self> {
        let origin = seed.origin();
        if !origin.is_tuple() {
            return None;
        }

        Some(Self {
            origin,
            skip_extensions: skip_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        })
    }

    /// The bare origin as a page address, e.g. "https://example.com/"
    pub fn root_url(&self) -> String {
        format!("{}/", self.origin.ascii_serialization())
    }

    // Maps a link to its canonical form
    //
    // Parameters:
    //   raw: the link as found (relative, protocol-relative or absolute)
    //   base: the page the link was found on
    //
    // Returns: Some(canonical_url), or None if the link is off-origin,
    // unparseable or points at a non-page file
    //
    // Example:
    //   raw = "../Index.html?x=1#top", base = "https://example.com/a/b/"
    //   result = Some("https://example.com/a/")
    pub fn canonicalize(&self, raw: &str, base: &Url) -> Option<String> {
        let mut url = base.join(raw.trim()).ok()?;

        if url.origin() != self.origin {
            return None;
        }

        url.set_fragment(None);
        url.set_query(None);

        let path = collapse_slashes(&fold_index_page(url.path()));
        if self.is_skipped_extension(&path) {
            return None;
        }
        url.set_path(&path);

        Some(url.to_string())
    }

    fn is_skipped_extension(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or("");
        match last_segment.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.skip_extensions.iter().any(|skip| *skip == ext)
            }
            None => false,
        }
    }
}

// "/docs/Index.HTML" -> "/docs/"
fn fold_index_page(path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    for suffix in ["/index.html", "/index.htm"] {
        if lower.ends_with(suffix) {
            // ASCII lower-casing keeps byte offsets intact
            let keep = path.len() - suffix.len() + 1;
            return path[..keep].to_string();
        }
    }
    path.to_string()
}

// "//a///b" -> "/a/b"
fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut previous_was_slash = false;

    for ch in path.chars() {
        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        collapsed.push(ch);
    }

    collapsed
}
