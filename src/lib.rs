//! # a3s-dork
//!
//! A dork search dispatcher that spreads search-engine queries over a pool of
//! validated proxies.
//!
//! A run goes through these stages:
//!
//! - Proxy validation against plain and TLS reference endpoints
//! - Expansion of dorks, engines and pages into independent tasks
//! - Bounded concurrent dispatch with a randomized pause per task
//! - Per-task retry with proxy rotation and exponential backoff
//! - Deduplication of discovered domains into a shared set
//!
//! ## Example
//!
//! ```rust,no_run
//! use a3s_dork::{DorkSearch, Engine, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RunConfig::new("dorks.txt")
//!         .with_proxy_file("proxy.txt")
//!         .with_engines(vec![Engine::Google, Engine::Bing])
//!         .with_pages(2);
//!
//!     let summary = DorkSearch::new(config).run().await?;
//!     println!("{} unique domains", summary.unique_domains);
//!     Ok(())
//! }
//! ```

mod engine;
mod error;
mod query;
mod result;
mod search;

pub mod aggregator;
pub mod config;
pub mod engines;
pub mod executor;
pub mod fetcher;
pub mod fetcher_http;
pub mod input;
pub mod proxy;
pub mod retry;
pub mod scheduler;
pub mod validator;

pub use aggregator::ResultSink;
pub use config::RunConfig;
pub use engine::Engine;
pub use error::{DorkError, Result};
pub use executor::{AttemptOutcome, SearchExecutor};
pub use fetcher::{FetchedPage, PageFetcher};
pub use fetcher_http::HttpFetcher;
pub use proxy::{ProxyEndpoint, ProxyPool};
pub use query::SearchTask;
pub use result::Domain;
pub use retry::{RetryCoordinator, RetryPolicy, TaskOutcome, TaskReport};
pub use scheduler::TaskScheduler;
pub use search::{DorkSearch, RunSummary};
pub use validator::ProxyValidator;
