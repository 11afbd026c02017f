//! End-to-end tests for dork runs.
//!
//! The offline scenarios drive the full pipeline with a scripted fetcher.
//! Tests that need network access and a working proxy are marked with
//! `#[ignore]` and read the proxy from `A3S_DORK_PROXY`.
//!
//! Run with: `cargo test --test integration -- --ignored`

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use url::Url;

use a3s_dork::scheduler::Jitter;
use a3s_dork::{
    DorkError, DorkSearch, Engine, FetchedPage, PageFetcher, ProxyEndpoint, ProxyPool, Result,
    RunConfig,
};

/// Serves Google result pages from a table keyed by `(dork, start)`.
#[derive(Default)]
struct ScriptedFetcher {
    pages: HashMap<(String, String), Vec<&'static str>>,
    blocked_proxies: Vec<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedFetcher {
    fn page(mut self, dork: &str, page: u32, hosts: Vec<&'static str>) -> Self {
        self.pages
            .insert((dork.to_string(), (page * 10).to_string()), hosts);
        self
    }

    fn blocking(mut self, proxy: &str) -> Self {
        self.blocked_proxies.push(proxy.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, proxy: &ProxyEndpoint, url: &str, _user_agent: &str) -> Result<FetchedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.blocked_proxies.iter().any(|p| p == proxy.raw()) {
            return Ok(FetchedPage::new(
                200,
                "<html>Our systems have detected unusual traffic</html>",
            ));
        }

        let url = Url::parse(url)?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        };
        let key = (param("q"), param("start"));
        self.seen.lock().unwrap().push(key.clone());

        let body: String = self
            .pages
            .get(&key)
            .map(|hosts| {
                hosts
                    .iter()
                    .map(|h| format!(r#"<div class="yuRUbf"><a href="https://{}/x">r</a></div>"#, h))
                    .collect()
            })
            .unwrap_or_default();
        Ok(FetchedPage::new(200, format!("<html><body>{}</body></html>", body)))
    }
}

fn pool(raw: &[&str]) -> ProxyPool {
    ProxyPool::new(
        raw.iter()
            .map(|r| Arc::new(ProxyEndpoint::parse(r).unwrap()))
            .collect(),
    )
}

fn temp_with(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

mod offline_tests {
    use super::*;

    #[tokio::test]
    async fn test_two_dorks_two_pages_without_retries() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("inurl:admin", 0, vec!["a.example", "www.b.example"])
                .page("inurl:admin", 1, vec!["c.example"])
                .page("ext:sql", 0, vec!["b.example", "d.example"])
                .page("ext:sql", 1, vec!["a.example", "shop.e.example"]),
        );
        let output = temp_with("");
        let config = RunConfig::new("unused")
            .with_output(output.path())
            .with_pages(2)
            .with_max_retries(0)
            .with_jitter(Jitter::none());

        let search = DorkSearch::with_fetcher(config, Arc::clone(&fetcher));
        let summary = search
            .run_with_pool(
                vec!["inurl:admin".to_string(), "ext:sql".to_string()],
                pool(&["10.0.0.1:8080", "10.0.0.2:8080"]),
            )
            .await
            .unwrap();

        assert_eq!(summary.tasks, 4);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);

        let mut seen = fetcher.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("ext:sql".to_string(), "0".to_string()),
                ("ext:sql".to_string(), "10".to_string()),
                ("inurl:admin".to_string(), "0".to_string()),
                ("inurl:admin".to_string(), "10".to_string()),
            ]
        );

        let content = std::fs::read_to_string(output.path()).unwrap();
        assert_eq!(
            content,
            "a.example\nb.example\nc.example\nd.example\nshop.e.example\n"
        );
        assert_eq!(summary.unique_domains, 5);
    }

    #[tokio::test]
    async fn test_empty_pages_exhaust_without_retries() {
        let fetcher = Arc::new(ScriptedFetcher::default().page("found", 0, vec!["a.example"]));
        let output = temp_with("");
        let config = RunConfig::new("unused")
            .with_output(output.path())
            .with_max_retries(0)
            .with_jitter(Jitter::none());

        let summary = DorkSearch::with_fetcher(config, Arc::clone(&fetcher))
            .run_with_pool(
                vec!["found".to_string(), "nothing".to_string()],
                pool(&["10.0.0.1:8080"]),
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.exhausted, 1);
        assert_eq!(std::fs::read_to_string(output.path()).unwrap(), "a.example\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_proxy_is_rotated_out() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("dork", 0, vec!["found.example"])
                .blocking("10.0.0.1:8080"),
        );
        let output = temp_with("");
        let config = RunConfig::new("unused")
            .with_output(output.path())
            .with_max_retries(1)
            .with_backoff_unit(Duration::from_millis(10))
            .with_jitter(Jitter::none());

        let summary = DorkSearch::with_fetcher(config, Arc::clone(&fetcher))
            .run_with_pool(
                vec!["dork".to_string()],
                pool(&["10.0.0.1:8080", "10.0.0.2:8080"]),
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert!(fetcher.calls.load(Ordering::SeqCst) <= 2);
        assert_eq!(
            std::fs::read_to_string(output.path()).unwrap(),
            "found.example\n"
        );
    }

    #[tokio::test]
    async fn test_sentinel_only_proxy_file_aborts() {
        let dorks = temp_with("inurl:admin\n");
        let proxies = temp_with("0.0.0.0:80\n\n0.0.0.0:80\n\n");
        let output = temp_with("already.example\n");
        let fetcher = Arc::new(ScriptedFetcher::default());

        let config = RunConfig::new(dorks.path())
            .with_proxy_file(proxies.path())
            .with_output(output.path());
        let result = DorkSearch::with_fetcher(config, Arc::clone(&fetcher)).run().await;

        assert!(matches!(result, Err(DorkError::NoProxies)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            std::fs::read_to_string(output.path()).unwrap(),
            "already.example\n"
        );
    }

    #[tokio::test]
    async fn test_empty_dork_file_aborts() {
        let dorks = temp_with("\n  \n");
        let proxies = temp_with("10.0.0.1:8080\n");
        let output = temp_with("");
        let fetcher = Arc::new(ScriptedFetcher::default());

        let config = RunConfig::new(dorks.path())
            .with_proxy_file(proxies.path())
            .with_output(output.path());
        let result = DorkSearch::with_fetcher(config, Arc::clone(&fetcher)).run().await;

        assert!(matches!(result, Err(DorkError::NoDorks)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}

mod live_tests {
    use super::*;
    use a3s_dork::validator::ProxyValidator;
    use a3s_dork::{HttpFetcher, SearchExecutor};

    fn live_proxy() -> Option<ProxyEndpoint> {
        let raw = std::env::var("A3S_DORK_PROXY").ok()?;
        match ProxyEndpoint::parse(&raw) {
            Ok(proxy) => Some(proxy),
            Err(e) => {
                println!("Invalid A3S_DORK_PROXY '{}': {}", raw, e);
                None
            }
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_proxy_validation() {
        let Some(proxy) = live_proxy() else {
            println!("A3S_DORK_PROXY not set, skipping");
            return;
        };
        let validator = ProxyValidator::new(Arc::new(HttpFetcher::new()));
        match validator.validate(vec![proxy]).await {
            Ok(pool) => {
                let proxy = pool.choose().unwrap();
                println!("Proxy {} is live as {:?}", proxy, proxy.scheme());
            }
            Err(e) => println!("Proxy failed validation: {}", e),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_engines() {
        let Some(proxy) = live_proxy() else {
            println!("A3S_DORK_PROXY not set, skipping");
            return;
        };
        let executor = SearchExecutor::new(Arc::new(HttpFetcher::new()));
        for engine in Engine::ALL {
            let outcome = executor.execute(engine, "rust programming", 0, &proxy).await;
            println!("Engine '{}' returned {:?}", engine, outcome);
            for domain in outcome.domains().iter().take(3) {
                println!("  {}", domain);
            }
        }
    }
}
