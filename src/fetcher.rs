//! Page fetcher abstraction for requests routed through a proxy.

use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::proxy::ProxyEndpoint;
use crate::Result;

/// Fixed user-agent rotation used for probes and searches.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.102 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.96 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15A372 Safari/604.1",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:85.0) Gecko/20100101 Firefox/85.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:92.0) Gecko/20100101 Firefox/92.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_2_3) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.3 Safari/605.1.15",
    "Mozilla/5.0 (iPad; CPU OS 14_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
];

/// Picks a user agent from the rotation.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Raw response of a single GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl FetchedPage {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for a 200 response.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for fetching a URL through a specific proxy.
///
/// Transport failures and timeouts surface as errors; non-200 responses are
/// returned as pages so callers can decide how to classify them.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issues a single GET for `url` through `proxy`.
    async fn fetch(&self, proxy: &ProxyEndpoint, url: &str, user_agent: &str)
        -> Result<FetchedPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_in_rotation() {
        for _ in 0..32 {
            let ua = random_user_agent();
            assert!(USER_AGENTS.contains(&ua));
        }
    }

    #[test]
    fn test_user_agent_rotation_size() {
        assert_eq!(USER_AGENTS.len(), 8);
        assert!(USER_AGENTS.iter().all(|ua| ua.starts_with("Mozilla/5.0")));
    }

    #[test]
    fn test_fetched_page_is_ok() {
        assert!(FetchedPage::new(200, "body").is_ok());
        assert!(!FetchedPage::new(429, "").is_ok());
        assert!(!FetchedPage::new(204, "").is_ok());
    }
}
