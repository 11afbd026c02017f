//! Google result extraction.

use super::{is_absolute_http, select_hrefs, ResultExtractor};
use crate::Result;

/// Result container anchors on Google's HTML results page.
const RESULT_SELECTOR: &str = "div.yuRUbf > a";

/// Extracts organic result links from Google results pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleExtractor;

impl ResultExtractor for GoogleExtractor {
    fn extract(&self, html: &str) -> Result<Vec<String>> {
        Ok(select_hrefs(html, RESULT_SELECTOR)?
            .into_iter()
            .filter_map(|href| {
                // Unwrap /url?q= redirects served to clients without JavaScript
                match href.strip_prefix("/url?q=") {
                    Some(q) => {
                        let target = q.split('&').next().unwrap_or(q);
                        urlencoding::decode(target).ok().map(|s| s.into_owned())
                    }
                    None => Some(href),
                }
            })
            .filter(|href| is_absolute_http(href))
            .collect())
    }
}
