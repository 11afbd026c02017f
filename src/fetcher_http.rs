//! HTTP page fetcher using each proxy's own reqwest client.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;

use crate::fetcher::{FetchedPage, PageFetcher};
use crate::proxy::ProxyEndpoint;
use crate::Result;

/// A page fetcher that sends plain HTTP requests through the proxy's client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    /// Creates a new `HttpFetcher`.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        proxy: &ProxyEndpoint,
        url: &str,
        user_agent: &str,
    ) -> Result<FetchedPage> {
        let response = proxy
            .client()
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage { status, body })
    }
}
