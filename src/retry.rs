//! Per-task retry with proxy rotation and exponential backoff.
//!
//! A task moves through `Attempting(k)` until it either finds domains or
//! exhausts its retry budget. Every failed attempt switches to another
//! randomly chosen proxy and waits `backoff_unit * 2^k` before trying again.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::aggregator::ResultSink;
use crate::executor::{AttemptOutcome, SearchExecutor};
use crate::fetcher::PageFetcher;
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::{Domain, SearchTask};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Retry behaviour for a single task.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles for every further attempt.
    pub backoff_unit: Duration,
    /// Accept a clean page with no results as success instead of retrying.
    pub accept_empty: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            accept_empty: false,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_accept_empty(mut self, accept_empty: bool) -> Self {
        self.accept_empty = accept_empty;
        self
    }

    /// Delay after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }
}

/// Final state of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// An attempt succeeded with these domains.
    Success(Vec<Domain>),
    /// Retry budget spent, or no proxy left to rotate to.
    Exhausted,
}

/// One attempt as seen by the coordinator.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Proxy the attempt went through.
    pub proxy: Arc<ProxyEndpoint>,
    /// What the attempt produced.
    pub outcome: AttemptOutcome,
}

/// Everything a finished task reports back.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: SearchTask,
    pub outcome: TaskOutcome,
    pub attempts: Vec<AttemptRecord>,
}

impl TaskReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Success(_))
    }

    /// Domains found by the task, empty when exhausted.
    pub fn domains(&self) -> &[Domain] {
        match &self.outcome {
            TaskOutcome::Success(domains) => domains,
            TaskOutcome::Exhausted => &[],
        }
    }
}

/// Wraps a [`SearchExecutor`] with the retry and rotation policy.
pub struct RetryCoordinator<F> {
    executor: Arc<SearchExecutor<F>>,
    pool: Arc<ProxyPool>,
    sink: Arc<ResultSink>,
    policy: RetryPolicy,
}

impl<F: PageFetcher> RetryCoordinator<F> {
    pub fn new(
        executor: Arc<SearchExecutor<F>>,
        pool: Arc<ProxyPool>,
        sink: Arc<ResultSink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            executor,
            pool,
            sink,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    /// Runs a task to success or exhaustion, starting on `initial_proxy`.
    ///
    /// Domains found are inserted into the shared sink before returning.
    pub async fn run(&self, task: &SearchTask, initial_proxy: Arc<ProxyEndpoint>) -> TaskReport {
        let mut proxy = initial_proxy;
        let mut attempts = Vec::new();

        for attempt in 0..=self.policy.max_retries {
            let outcome = self
                .executor
                .execute(task.engine, &task.dork, task.page, &proxy)
                .await;
            attempts.push(AttemptRecord {
                proxy: Arc::clone(&proxy),
                outcome: outcome.clone(),
            });

            match outcome {
                AttemptOutcome::Found(domains) => {
                    let added = self.sink.extend(domains.iter().cloned());
                    debug!("{}: {} new of {} domains", task, added, domains.len());
                    return self.report(task, TaskOutcome::Success(domains), attempts);
                }
                AttemptOutcome::Empty if self.policy.accept_empty => {
                    return self.report(task, TaskOutcome::Success(Vec::new()), attempts);
                }
                _ => {}
            }

            if attempt == self.policy.max_retries {
                break;
            }

            proxy = match self.pool.choose_other(&proxy) {
                Some(next) => next,
                None => {
                    warn!("No valid proxy left to retry {}", task);
                    break;
                }
            };
            let delay = self.policy.backoff(attempt);
            info!(
                "Retrying {} with proxy {} in {:?} (attempt {}/{})",
                task,
                proxy,
                delay,
                attempt + 2,
                self.policy.max_retries + 1
            );
            tokio::time::sleep(delay).await;
        }

        warn!("{} exhausted after {} attempts", task, attempts.len());
        self.report(task, TaskOutcome::Exhausted, attempts)
    }

    fn report(
        &self,
        task: &SearchTask,
        outcome: TaskOutcome,
        attempts: Vec<AttemptRecord>,
    ) -> TaskReport {
        TaskReport {
            task: task.clone(),
            outcome,
            attempts,
        }
    }
}
