//! Bounded concurrent dispatch of search tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::fetcher::PageFetcher;
use crate::retry::{RetryCoordinator, TaskOutcome, TaskReport};
use crate::{DorkError, Result, SearchTask};

/// Default number of tasks holding a slot at once.
pub const DEFAULT_CONCURRENCY: usize = 500;

/// Randomized pause a task takes before giving up its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub min: Duration,
    pub max: Duration,
}

impl Jitter {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draws a delay uniformly from `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(2))
    }
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of tasks running at once.
    pub concurrency: usize,
    /// Pause after each task before its slot is released.
    pub jitter: Jitter,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            jitter: Jitter::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Runs every task through the retry coordinator behind a counting gate.
pub struct TaskScheduler<F> {
    coordinator: Arc<RetryCoordinator<F>>,
    config: SchedulerConfig,
    holding: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl<F: PageFetcher + 'static> TaskScheduler<F> {
    pub fn new(coordinator: Arc<RetryCoordinator<F>>, config: SchedulerConfig) -> Self {
        Self {
            coordinator,
            config,
            holding: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Highest number of tasks that held a slot at the same time.
    pub fn peak_slots(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Runs all tasks and waits for every one of them to finish.
    ///
    /// Reports come back in completion order. Fails up front with
    /// [`DorkError::NoProxies`] if the pool is empty.
    pub async fn run(&self, tasks: Vec<SearchTask>) -> Result<Vec<TaskReport>> {
        if self.coordinator.pool().is_empty() {
            return Err(DorkError::NoProxies);
        }

        let total = tasks.len();
        let gate = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        info!(
            "Dispatching {} tasks with up to {} in flight",
            total, self.config.concurrency
        );

        let mut set = JoinSet::new();
        for task in tasks {
            let gate = Arc::clone(&gate);
            let coordinator = Arc::clone(&self.coordinator);
            let jitter = self.config.jitter;
            let holding = Arc::clone(&self.holding);
            let peak = Arc::clone(&self.peak);

            set.spawn(async move {
                let permit = gate
                    .acquire_owned()
                    .await
                    .map_err(|e| DorkError::Other(format!("concurrency gate closed: {}", e)))?;
                let now = holding.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);

                let report = match coordinator.pool().choose() {
                    Some(proxy) => coordinator.run(&task, proxy).await,
                    None => TaskReport {
                        task,
                        outcome: TaskOutcome::Exhausted,
                        attempts: Vec::new(),
                    },
                };

                let pause = jitter.sample();
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }

                holding.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
                Ok::<_, DorkError>(report)
            });
        }

        let mut reports = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(report)) => {
                    debug!("Finished {} ({} of {})", report.task, reports.len() + 1, total);
                    reports.push(report);
                }
                Ok(Err(e)) => error!("Search task failed: {}", e),
                Err(e) => error!("Search task panicked: {}", e),
            }
        }

        debug!("At most {} tasks held a slot at once", self.peak_slots());
        Ok(reports)
    }
}

/// Totals over a set of finished tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub tasks: usize,
    pub succeeded: usize,
    pub exhausted: usize,
    pub attempts: usize,
}

impl ScheduleStats {
    pub fn from_reports(reports: &[TaskReport]) -> Self {
        reports.iter().fold(Self::default(), |mut stats, report| {
            stats.tasks += 1;
            stats.attempts += report.attempts.len();
            if report.is_success() {
                stats.succeeded += 1;
            } else {
                stats.exhausted += 1;
            }
            stats
        })
    }
}
