//! Concurrent proxy validation.
//!
//! Each candidate is probed once against a plain and a TLS reference
//! endpoint through its own client. Proxies are disposable, so a failed probe
//! is never retried.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::fetcher::{random_user_agent, PageFetcher};
use crate::proxy::{ProxyEndpoint, ProxyPool, ProxyScheme};
use crate::{DorkError, Result};

/// Default plain-HTTP reference endpoint.
pub const DEFAULT_HTTP_TARGET: &str = "http://httpbin.org/ip";

/// Default TLS reference endpoint.
pub const DEFAULT_HTTPS_TARGET: &str = "https://httpbin.org/ip";

/// Default number of proxies probed at once.
pub const DEFAULT_VALIDATION_CONCURRENCY: usize = 200;

/// Default upper bound for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for proxy validation.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Plain-HTTP reference URL.
    pub http_target: String,
    /// TLS reference URL.
    pub https_target: String,
    /// Maximum number of proxies probed concurrently.
    pub concurrency: usize,
    /// Upper bound for each probe request.
    pub probe_timeout: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            http_target: DEFAULT_HTTP_TARGET.to_string(),
            https_target: DEFAULT_HTTPS_TARGET.to_string(),
            concurrency: DEFAULT_VALIDATION_CONCURRENCY,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(mut self, http: impl Into<String>, https: impl Into<String>) -> Self {
        self.http_target = http.into();
        self.https_target = https.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Liveness of one proxy against both reference endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub http: bool,
    pub https: bool,
}

impl ProbeResult {
    /// Scheme the proxy is used with; HTTPS wins when both probes pass.
    pub fn scheme(&self) -> Option<ProxyScheme> {
        if self.https {
            Some(ProxyScheme::Https)
        } else if self.http {
            Some(ProxyScheme::Http)
        } else {
            None
        }
    }
}

/// Probes candidate proxies and builds the pool of live ones.
pub struct ProxyValidator<F> {
    fetcher: Arc<F>,
    config: ValidatorConfig,
}

impl<F: PageFetcher> ProxyValidator<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_config(fetcher, ValidatorConfig::default())
    }

    pub fn with_config(fetcher: Arc<F>, config: ValidatorConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Probes a single proxy against both reference endpoints.
    pub async fn probe(&self, proxy: &ProxyEndpoint) -> ProbeResult {
        let (http, https) = futures::join!(
            self.probe_target(proxy, &self.config.http_target, "HTTP"),
            self.probe_target(proxy, &self.config.https_target, "HTTPS"),
        );
        ProbeResult { http, https }
    }

    async fn probe_target(&self, proxy: &ProxyEndpoint, target: &str, label: &str) -> bool {
        let request = self.fetcher.fetch(proxy, target, random_user_agent());
        match tokio::time::timeout(self.config.probe_timeout, request).await {
            Ok(Ok(page)) if page.is_ok() => {
                info!("[LIVE {}] {} - Status Code: {}", label, proxy.raw(), page.status);
                true
            }
            Ok(Ok(page)) => {
                debug!("[DEAD {}] {} - Status Code: {}", label, proxy.raw(), page.status);
                false
            }
            Ok(Err(e)) => {
                debug!("[DEAD {}] {} - Error: {}", label, proxy.raw(), e);
                false
            }
            Err(_) => {
                debug!("[DEAD {}] {} - timed out", label, proxy.raw());
                false
            }
        }
    }

    /// Validates all candidates concurrently and returns the live pool.
    ///
    /// A candidate that already carries a scheme keeps it; re-validation only
    /// decides whether it stays in the pool. Fails with [`DorkError::NoProxies`] when there are no candidates or
    /// none of them survive.
    pub async fn validate(&self, candidates: Vec<ProxyEndpoint>) -> Result<ProxyPool> {
        if candidates.is_empty() {
            return Err(DorkError::NoProxies);
        }
        let total = candidates.len();

        let live: Vec<Arc<ProxyEndpoint>> = stream::iter(candidates)
            .map(|proxy| async move {
                match self.probe(&proxy).await.scheme() {
                    Some(scheme) => {
                        if !proxy.mark_validated(scheme) {
                            warn!(
                                "{} was already validated as {:?}, keeping it",
                                proxy.raw(),
                                proxy.scheme()
                            );
                        }
                        Some(Arc::new(proxy))
                    }
                    None => None,
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .filter_map(|proxy| async move { proxy })
            .collect()
            .await;

        info!("{} of {} proxies passed validation", live.len(), total);
        if live.is_empty() {
            warn!("No proxy passed validation");
            return Err(DorkError::NoProxies);
        }
        Ok(ProxyPool::new(live))
    }
}
