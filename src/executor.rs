//! Single fetch-and-extract attempt against one engine through one proxy.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::engines::ResultExtractor;
use crate::fetcher::{random_user_agent, PageFetcher};
use crate::proxy::ProxyEndpoint;
use crate::{Domain, Engine};

/// Permissive link scan used when structured extraction finds nothing.
static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>()`;]+"#).expect("valid link pattern"));

/// Outcome of a single search attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// At least one domain was extracted.
    Found(Vec<Domain>),
    /// The page loaded but yielded no domains.
    Empty,
    /// The engine served a bot-check or CAPTCHA page.
    Blocked,
    /// Transport error, timeout or non-200 status.
    Failed(String),
}

impl AttemptOutcome {
    /// Domains found by the attempt, empty for every non-success outcome.
    pub fn domains(&self) -> &[Domain] {
        match self {
            AttemptOutcome::Found(domains) => domains,
            _ => &[],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, AttemptOutcome::Found(_))
    }
}

/// Performs search attempts, delegating markup parsing to per-engine extractors.
pub struct SearchExecutor<F> {
    fetcher: Arc<F>,
    extractors: HashMap<Engine, Arc<dyn ResultExtractor>>,
}

impl<F: PageFetcher> SearchExecutor<F> {
    /// Creates an executor using the built-in extractor of every engine.
    pub fn new(fetcher: Arc<F>) -> Self {
        let extractors = Engine::ALL
            .iter()
            .map(|engine| (*engine, Arc::from(engine.extractor())))
            .collect();
        Self {
            fetcher,
            extractors,
        }
    }

    /// Replaces the extractor used for one engine.
    pub fn with_extractor(
        mut self,
        engine: Engine,
        extractor: impl ResultExtractor + 'static,
    ) -> Self {
        self.extractors.insert(engine, Arc::new(extractor));
        self
    }

    /// Fetches one results page and classifies it.
    ///
    /// `page` is zero-based. Retry decisions are left to the caller.
    pub async fn execute(
        &self,
        engine: Engine,
        dork: &str,
        page: u32,
        proxy: &ProxyEndpoint,
    ) -> AttemptOutcome {
        let url = match engine.search_url(dork, page) {
            Ok(url) => url,
            Err(e) => return AttemptOutcome::Failed(e.to_string()),
        };
        info!("Searching {}: dork '{}', page {} via {}", engine, dork, page + 1, proxy);

        let fetched = match self
            .fetcher
            .fetch(proxy, url.as_str(), random_user_agent())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch {} for dork '{}', page {}: {}", engine, dork, page + 1, e);
                return AttemptOutcome::Failed(e.to_string());
            }
        };

        if !fetched.is_ok() {
            warn!(
                "Failed to fetch {} for dork '{}', page {}: status {}",
                engine,
                dork,
                page + 1,
                fetched.status
            );
            return AttemptOutcome::Failed(format!("status {}", fetched.status));
        }

        if engine.is_blocked(&fetched.body) {
            warn!("CAPTCHA detected on {} for dork '{}', page {}", engine, dork, page + 1);
            return AttemptOutcome::Blocked;
        }

        let domains = self.extract_domains(engine, &fetched.body);
        info!("{}: dork '{}', page {} found {} domains", engine, dork, page + 1, domains.len());

        if domains.is_empty() {
            AttemptOutcome::Empty
        } else {
            AttemptOutcome::Found(domains)
        }
    }

    /// Extracts normalized, deduplicated domains from a results page.
    pub fn extract_domains(&self, engine: Engine, html: &str) -> Vec<Domain> {
        let links = match self.extractors.get(&engine) {
            Some(extractor) => extractor.extract(html).unwrap_or_else(|e| {
                warn!("Failed to parse {} HTML: {}", engine, e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let domains = normalize(engine, links.iter().map(String::as_str));
        if !domains.is_empty() {
            return domains;
        }

        debug!("No structured {} results, scanning raw body for links", engine);
        normalize(engine, LINK_PATTERN.find_iter(html).map(|m| m.as_str()))
    }
}

fn normalize<'a>(engine: Engine, links: impl Iterator<Item = &'a str>) -> Vec<Domain> {
    let mut seen = HashSet::new();
    links
        .filter_map(|link| Domain::from_link(link, |host| engine.is_self_host(host)))
        .filter(|domain| seen.insert(domain.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchedPage;
    use crate::{DorkError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned response and records requested URLs.
    struct CannedFetcher {
        response: std::result::Result<FetchedPage, String>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl CannedFetcher {
        fn ok(body: &str) -> Arc<Self> {
            Self::status(200, body)
        }

        fn status(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(FetchedPage::new(status, body)),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn error(message: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(
            &self,
            _proxy: &ProxyEndpoint,
            url: &str,
            user_agent: &str,
        ) -> Result<FetchedPage> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), user_agent.to_string()));
            self.response.clone().map_err(DorkError::Other)
        }
    }

    fn proxy() -> ProxyEndpoint {
        ProxyEndpoint::parse("127.0.0.1:8080").unwrap()
    }

    fn hosts(outcome: &AttemptOutcome) -> Vec<&str> {
        outcome.domains().iter().map(Domain::as_str).collect()
    }

    const BING_PAGE: &str = r#"
        <ol id="b_results">
            <li class="b_algo"><h2><a href="https://www.target-one.com/admin">One</a></h2></li>
            <li class="b_algo"><h2><a href="https://target-two.org/login">Two</a></h2></li>
            <li class="b_algo"><h2><a href="https://target-one.com/other">One again</a></h2></li>
            <li class="b_algo"><h2><a href="https://www.bing.com/ck/a?u=x">Tracked</a></h2></li>
        </ol>
    "#;

    #[tokio::test]
    async fn test_execute_found() {
        let fetcher = CannedFetcher::ok(BING_PAGE);
        let executor = SearchExecutor::new(Arc::clone(&fetcher));

        let outcome = executor.execute(Engine::Bing, "inurl:admin", 1, &proxy()).await;
        assert_eq!(hosts(&outcome), vec!["target-one.com", "target-two.org"]);
        assert!(outcome.is_found());

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].0.starts_with("https://www.bing.com/search?"));
        assert!(requests[0].0.contains("first=11"));
        assert!(crate::fetcher::USER_AGENTS.contains(&requests[0].1.as_str()));
    }

    #[tokio::test]
    async fn test_execute_transport_error() {
        let executor = SearchExecutor::new(CannedFetcher::error("connection reset"));
        let outcome = executor.execute(Engine::Google, "x", 0, &proxy()).await;
        assert!(matches!(outcome, AttemptOutcome::Failed(ref m) if m.contains("connection reset")));
        assert!(outcome.domains().is_empty());
    }

    #[tokio::test]
    async fn test_execute_non_200() {
        let executor = SearchExecutor::new(CannedFetcher::status(429, BING_PAGE));
        let outcome = executor.execute(Engine::Bing, "x", 0, &proxy()).await;
        assert_eq!(outcome, AttemptOutcome::Failed("status 429".to_string()));
    }

    #[tokio::test]
    async fn test_execute_blocked() {
        let body = "<html><body>Please complete the CAPTCHA https://example.com</body></html>";
        let executor = SearchExecutor::new(CannedFetcher::ok(body));
        let outcome = executor.execute(Engine::DuckDuckGo, "x", 0, &proxy()).await;
        assert_eq!(outcome, AttemptOutcome::Blocked);
    }

    #[tokio::test]
    async fn test_execute_empty() {
        let body = r#"<html><body><a href="https://duckduckgo.com/about">About</a></body></html>"#;
        let executor = SearchExecutor::new(CannedFetcher::ok(body));
        let outcome = executor.execute(Engine::DuckDuckGo, "x", 0, &proxy()).await;
        assert_eq!(outcome, AttemptOutcome::Empty);
    }

    #[tokio::test]
    async fn test_execute_falls_back_to_link_scan() {
        let body = r#"
            <html><body>
                <div class="new-markup"><span>https://drifted.example.com/path</span></div>
                <script src="https://www.google.com/xjs/app.js"></script>
                <a href="https://fonts.gstatic.com/font.woff">font</a>
                <p>see http://www.second.example.net/page and https://drifted.example.com/again</p>
            </body></html>
        "#;
        let executor = SearchExecutor::new(CannedFetcher::ok(body));
        let outcome = executor.execute(Engine::Google, "x", 0, &proxy()).await;
        assert_eq!(hosts(&outcome), vec!["drifted.example.com", "second.example.net"]);
    }

    #[test]
    fn test_link_scan_stops_at_script_quotes() {
        let executor = SearchExecutor::new(CannedFetcher::ok(""));
        let html = "<script>var u='https://cdn.example.com';load('https://api.example.org');</script>\
                    <a href='https://single.example.net'>x</a>\
                    <p>(see https://paren.example.io) `https://tick.example.dev`</p>";
        let domains = executor.extract_domains(Engine::Google, html);
        let hosts: Vec<&str> = domains.iter().map(Domain::as_str).collect();
        assert_eq!(
            hosts,
            vec![
                "cdn.example.com",
                "api.example.org",
                "single.example.net",
                "paren.example.io",
                "tick.example.dev"
            ]
        );
    }

    #[test]
    fn test_extract_domains_prefers_structured() {
        let executor = SearchExecutor::new(CannedFetcher::ok(""));
        let html = r#"
            <div class="yuRUbf"><a href="https://structured.example/">s</a></div>
            <p>https://unstructured.example/</p>
        "#;
        let domains = executor.extract_domains(Engine::Google, html);
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].as_str(), "structured.example");
    }

    #[test]
    fn test_custom_extractor() {
        let executor = SearchExecutor::new(CannedFetcher::ok("")).with_extractor(
            Engine::Bing,
            |_: &str| -> Result<Vec<String>> {
                Ok(vec![
                    "https://custom.example/a".to_string(),
                    "https://www.bing.com/".to_string(),
                ])
            },
        );
        let domains = executor.extract_domains(Engine::Bing, "<html></html>");
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].as_str(), "custom.example");
    }

    #[test]
    fn test_attempt_outcome_domains() {
        assert!(AttemptOutcome::Empty.domains().is_empty());
        assert!(AttemptOutcome::Blocked.domains().is_empty());
        assert!(!AttemptOutcome::Failed("x".into()).is_found());
    }
}
