// src/sitemap/heuristics.rs
// =============================================================================
// Guesses <changefreq> and <priority> from a page's path.
//
// These are hints for search engines, not facts about the site. What matters
// is that the rules are applied in a fixed order, because the first match
// wins and the values end up in the published sitemap.
// =============================================================================

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn change_frequency(path: &str) -> ChangeFrequency {
    if path == "/" || path.starts_with("/blog") {
        ChangeFrequency::Weekly
    } else if path.starts_with("/products") {
        ChangeFrequency::Monthly
    } else if path.contains("contact") {
        ChangeFrequency::Yearly
    } else {
        ChangeFrequency::Monthly
    }
}

pub fn priority(path: &str) -> f32 {
    if path == "/" {
        1.0
    } else if path.starts_with("/blog/") {
        0.8
    } else if path.starts_with("/products") {
        0.7
    } else if path.contains("contact") {
        0.4
    } else {
        0.6
    }
}
