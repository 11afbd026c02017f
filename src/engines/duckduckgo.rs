//! DuckDuckGo result extraction.

use super::{is_absolute_http, select_hrefs, ResultExtractor};
use crate::Result;

const RESULT_SELECTOR: &str = "a.result__a";

/// Extracts organic result links from the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDuckGoExtractor;

impl ResultExtractor for DuckDuckGoExtractor {
    fn extract(&self, html: &str) -> Result<Vec<String>> {
        Ok(select_hrefs(html, RESULT_SELECTOR)?
            .into_iter()
            .map(|href| extract_redirect_url(&href).unwrap_or(href))
            .filter(|href| is_absolute_http(href))
            .collect())
    }
}

/// Decodes the target of a `//duckduckgo.com/l/?uddg=` redirect link.
fn extract_redirect_url(url: &str) -> Option<String> {
    let (_, encoded) = url.split_once("duckduckgo.com/l/?uddg=")?;
    let encoded = encoded.split('&').next().unwrap_or(encoded);
    let decoded = urlencoding::decode(encoded).ok()?;
    Some(decoded.into_owned())
}
