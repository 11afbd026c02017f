//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::proxy::DEFAULT_PROXY_TIMEOUT;
use crate::retry::RetryPolicy;
use crate::scheduler::{Jitter, SchedulerConfig};
use crate::validator::ValidatorConfig;
use crate::Engine;

/// Everything a dork run needs, with the operator-facing defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Dork list, one query per line.
    pub dork_file: PathBuf,
    /// Proxy list, one `[user:pass@]host:port` per line.
    pub proxy_file: PathBuf,
    /// Results file, appended to.
    pub output: PathBuf,
    /// Engines every dork is sent to.
    pub engines: Vec<Engine>,
    /// Result pages fetched per dork and engine.
    pub pages: u32,
    /// Per-request timeout of each proxy client.
    pub request_timeout: Duration,
    pub validator: ValidatorConfig,
    pub scheduler: SchedulerConfig,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dork_file: PathBuf::new(),
            proxy_file: PathBuf::from("proxy.txt"),
            output: PathBuf::from("results.txt"),
            engines: vec![Engine::Google],
            pages: 1,
            request_timeout: DEFAULT_PROXY_TIMEOUT,
            validator: ValidatorConfig::default(),
            scheduler: SchedulerConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Creates a configuration for the given dork file.
    pub fn new(dork_file: impl Into<PathBuf>) -> Self {
        Self {
            dork_file: dork_file.into(),
            ..Self::default()
        }
    }

    pub fn with_proxy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.proxy_file = path.into();
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Sets the engines; an empty list falls back to Google.
    pub fn with_engines(mut self, engines: Vec<Engine>) -> Self {
        self.engines = if engines.is_empty() {
            vec![Engine::Google]
        } else {
            engines
        };
        self
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.scheduler = self.scheduler.with_concurrency(concurrency);
        self
    }

    pub fn with_validation_concurrency(mut self, concurrency: usize) -> Self {
        self.validator = self.validator.with_concurrency(concurrency);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.retry = self.retry.with_max_retries(retries);
        self
    }

    /// Sets the timeout used both for proxy clients and validation probes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self.validator = self.validator.with_probe_timeout(timeout);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.scheduler = self.scheduler.with_jitter(jitter);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.retry = self.retry.with_backoff_unit(unit);
        self
    }

    pub fn with_accept_empty(mut self, accept_empty: bool) -> Self {
        self.retry = self.retry.with_accept_empty(accept_empty);
        self
    }
}
