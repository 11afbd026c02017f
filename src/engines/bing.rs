//! Bing result extraction.

use super::{is_absolute_http, select_hrefs, ResultExtractor};
use crate::Result;

const RESULT_SELECTOR: &str = "li.b_algo a";

/// Click-tracking redirect path; the real target is not recoverable from it.
const TRACKING_PATH: &str = "bing.com/ck/a";

/// Extracts organic result links from Bing results pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct BingExtractor;

impl ResultExtractor for BingExtractor {
    fn extract(&self, html: &str) -> Result<Vec<String>> {
        Ok(select_hrefs(html, RESULT_SELECTOR)?
            .into_iter()
            .filter(|href| is_absolute_http(href) && !href.contains(TRACKING_PATH))
            .collect())
    }
}
