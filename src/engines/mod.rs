//! Result extractors for the supported engines.
//!
//! An extractor turns a results page into absolute result links. It does not
//! normalize hosts or judge whether the page was blocked; both happen in the
//! executor.

use scraper::{Html, Selector};

use crate::{DorkError, Result};

mod bing;
mod duckduckgo;
mod google;

pub use bing::BingExtractor;
pub use duckduckgo::DuckDuckGoExtractor;
pub use google::GoogleExtractor;

/// Extracts absolute result URLs from an engine's HTML.
pub trait ResultExtractor: Send + Sync {
    /// Returns the absolute `http(s)` result links found in `html`.
    fn extract(&self, html: &str) -> Result<Vec<String>>;
}

impl<F> ResultExtractor for F
where
    F: Fn(&str) -> Result<Vec<String>> + Send + Sync,
{
    fn extract(&self, html: &str) -> Result<Vec<String>> {
        self(html)
    }
}

/// Returns true for links starting with `http://` or `https://`.
pub(crate) fn is_absolute_http(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

/// Collects the `href` of every element matching `css`.
pub(crate) fn select_hrefs(html: &str, css: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(css)
        .map_err(|e| DorkError::Parse(format!("Failed to parse selector: {:?}", e)))?;

    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect())
}
