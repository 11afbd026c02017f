//! Run orchestration.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::ResultSink;
use crate::config::RunConfig;
use crate::executor::SearchExecutor;
use crate::fetcher::PageFetcher;
use crate::fetcher_http::HttpFetcher;
use crate::input::{append_results, load_dorks, load_proxies};
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::retry::RetryCoordinator;
use crate::scheduler::{ScheduleStats, TaskScheduler};
use crate::validator::ProxyValidator;
use crate::{DorkError, Engine, Result, SearchTask};

/// Totals of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dorks: usize,
    pub pages: u32,
    pub engines: Vec<Engine>,
    pub tasks: usize,
    pub proxies_loaded: usize,
    pub proxies_valid: usize,
    pub succeeded: usize,
    pub exhausted: usize,
    pub unique_domains: usize,
    pub duration_ms: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engines: Vec<&str> = self.engines.iter().map(|e| e.name()).collect();
        writeln!(f, "Dorks:          {}", self.dorks)?;
        writeln!(f, "Engines:        {}", engines.join(", "))?;
        writeln!(f, "Pages:          {}", self.pages)?;
        writeln!(f, "Tasks:          {} ({} ok, {} exhausted)", self.tasks, self.succeeded, self.exhausted)?;
        writeln!(f, "Proxies:        {} valid of {}", self.proxies_valid, self.proxies_loaded)?;
        writeln!(f, "Unique domains: {}", self.unique_domains)?;
        write!(f, "Duration:       {:.2}s", self.duration_ms as f64 / 1000.0)
    }
}

/// Drives a complete dork run: load, validate, dispatch, write.
pub struct DorkSearch<F = HttpFetcher> {
    fetcher: Arc<F>,
    config: RunConfig,
}

impl DorkSearch<HttpFetcher> {
    /// Creates a run that talks to the real engines.
    pub fn new(config: RunConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpFetcher::new()))
    }
}

impl<F: PageFetcher + 'static> DorkSearch<F> {
    /// Creates a run using a custom page fetcher.
    pub fn with_fetcher(config: RunConfig, fetcher: Arc<F>) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the whole pipeline from the configured files.
    ///
    /// Missing or empty inputs, and a pool with no live proxy, abort the run
    /// before any search request is sent or the output file is touched.
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();

        let dorks = load_dorks(&self.config.dork_file).await?;
        let candidates = load_proxies(&self.config.proxy_file, self.config.request_timeout).await?;
        if candidates.is_empty() {
            warn!("No usable proxy in '{}'", self.config.proxy_file.display());
            return Err(DorkError::NoProxies);
        }
        let loaded = candidates.len();

        let pool = self.validate(candidates).await?;
        let mut summary = self.dispatch(dorks, pool, start).await?;
        summary.proxies_loaded = loaded;
        Ok(summary)
    }

    /// Probes the candidates and returns the pool of live proxies.
    pub async fn validate(&self, candidates: Vec<ProxyEndpoint>) -> Result<ProxyPool> {
        info!("Validating {} proxies", candidates.len());
        ProxyValidator::with_config(Arc::clone(&self.fetcher), self.config.validator.clone())
            .validate(candidates)
            .await
    }

    /// Runs the dorks against an already validated pool and writes the output.
    pub async fn run_with_pool(&self, dorks: Vec<String>, pool: ProxyPool) -> Result<RunSummary> {
        self.dispatch(dorks, pool, Instant::now()).await
    }

    async fn dispatch(
        &self,
        dorks: Vec<String>,
        pool: ProxyPool,
        start: Instant,
    ) -> Result<RunSummary> {
        if dorks.is_empty() {
            return Err(DorkError::NoDorks);
        }
        if pool.is_empty() {
            return Err(DorkError::NoProxies);
        }

        let tasks = SearchTask::cross_product(&dorks, &self.config.engines, self.config.pages);
        let task_count = tasks.len();
        let proxies_valid = pool.len();
        info!(
            "Searching {} dorks on {} engines, {} pages each ({} tasks)",
            dorks.len(),
            self.config.engines.len(),
            self.config.pages,
            task_count
        );

        let sink = Arc::new(ResultSink::new());
        let executor = Arc::new(SearchExecutor::new(Arc::clone(&self.fetcher)));
        let coordinator = Arc::new(RetryCoordinator::new(
            executor,
            Arc::new(pool),
            Arc::clone(&sink),
            self.config.retry.clone(),
        ));
        let scheduler = TaskScheduler::new(coordinator, self.config.scheduler.clone());

        let reports = scheduler.run(tasks).await?;
        let stats = ScheduleStats::from_reports(&reports);

        let domains = sink.sorted();
        append_results(&self.config.output, &domains).await?;

        Ok(RunSummary {
            dorks: dorks.len(),
            pages: self.config.pages,
            engines: self.config.engines.clone(),
            tasks: task_count,
            proxies_loaded: proxies_valid,
            proxies_valid,
            succeeded: stats.succeeded,
            exhausted: stats.exhausted,
            unique_domains: domains.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
