//! Proxy endpoints and the validated proxy pool.
//!
//! Every endpoint owns a dedicated HTTP client routed through it. Endpoints
//! are parsed from operator input, validated once, and then shared read-only
//! by every search task through a [`ProxyPool`].

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::{Client, Proxy as ReqwestProxy};

use crate::{DorkError, Result};

/// Default per-request timeout for clients bound to a proxy.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// Sentinel entry found in scraped proxy lists; never a usable proxy.
pub const SENTINEL_PROXY: &str = "0.0.0.0:80";

static PROXY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<user>[^:@\s]+):(?P<pass>[^@\s]+)@)?(?P<host>[^:@\s]+):(?P<port>\d{1,5})$")
        .expect("valid proxy line pattern")
});

/// Protocol a validated proxy is used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    /// Only plain HTTP targets are reachable through the proxy.
    Http,
    /// HTTPS targets are reachable through the proxy.
    Https,
}

impl ProxyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Https => "https",
        }
    }
}

/// A single proxy parsed from one line of operator input.
pub struct ProxyEndpoint {
    raw: String,
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    scheme: OnceLock<ProxyScheme>,
    client: Client,
}

impl ProxyEndpoint {
    /// Parses `[user:pass@]host:port` with the default request timeout.
    pub fn parse(line: &str) -> Result<Self> {
        Self::parse_with_timeout(line, DEFAULT_PROXY_TIMEOUT)
    }

    /// Parses `[user:pass@]host:port`, building a client with `timeout`.
    pub fn parse_with_timeout(line: &str, timeout: Duration) -> Result<Self> {
        let raw = line.trim();
        let caps = PROXY_LINE
            .captures(raw)
            .ok_or_else(|| DorkError::InvalidProxy(raw.to_string()))?;

        let port: u16 = caps["port"]
            .parse()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| DorkError::InvalidProxy(raw.to_string()))?;

        let host = caps["host"].to_string();
        let username = caps.name("user").map(|m| m.as_str().to_string());
        let password = caps.name("pass").map(|m| m.as_str().to_string());
        let transport = transport_url(&host, port, username.as_deref(), password.as_deref());
        let client = build_client(raw, &transport, timeout)?;

        Ok(Self {
            raw: raw.to_string(),
            host,
            port,
            username,
            password,
            scheme: OnceLock::new(),
            client,
        })
    }

    /// URL the client connects to the proxy with.
    pub fn transport_url(&self) -> String {
        transport_url(
            &self.host,
            self.port,
            self.username.as_deref(),
            self.password.as_deref(),
        )
    }

    /// The line as supplied by the operator, trimmed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The client bound to this proxy.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Records the validated scheme. Only the first call has any effect.
    pub fn mark_validated(&self, scheme: ProxyScheme) -> bool {
        self.scheme.set(scheme).is_ok()
    }

    /// The validated scheme, if validation has succeeded.
    pub fn scheme(&self) -> Option<ProxyScheme> {
        self.scheme.get().copied()
    }

    /// Scheme-qualified address, available once validated.
    pub fn url(&self) -> Option<String> {
        self.scheme()
            .map(|scheme| format!("{}://{}", scheme.as_str(), self.raw))
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth", &self.username.is_some())
            .field("scheme", &self.scheme())
            .finish()
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Userinfo is percent-encoded so `#`, `/`, `?` and literal `%` survive intact.
fn transport_url(host: &str, port: u16, username: Option<&str>, password: Option<&str>) -> String {
    match (username, password) {
        (Some(user), Some(pass)) => format!(
            "http://{}:{}@{}:{}",
            urlencoding::encode(user),
            urlencoding::encode(pass),
            host,
            port
        ),
        _ => format!("http://{}:{}", host, port),
    }
}

/// Builds the client routed through a proxy.
///
/// Certificate checks are disabled: intercepting proxies commonly present
/// self-signed certificates.
fn build_client(raw: &str, transport: &str, timeout: Duration) -> Result<Client> {
    let proxy = ReqwestProxy::all(transport)
        .map_err(|e| DorkError::InvalidProxy(format!("{}: {}", raw, e)))?;

    Client::builder()
        .proxy(proxy)
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .connect_timeout(timeout)
        .tcp_keepalive(Duration::from_secs(30))
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| DorkError::Other(format!("Failed to create HTTP client: {}", e)))
}

/// Read-only set of validated proxies shared by all search tasks.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: Vec<Arc<ProxyEndpoint>>,
}

impl ProxyPool {
    /// Creates a pool from already validated endpoints.
    pub fn new(proxies: Vec<Arc<ProxyEndpoint>>) -> Self {
        Self { proxies }
    }

    /// Returns the number of proxies in the pool.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Returns whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Picks a proxy uniformly at random.
    pub fn choose(&self) -> Option<Arc<ProxyEndpoint>> {
        self.proxies.choose(&mut rand::thread_rng()).cloned()
    }

    /// Picks a proxy uniformly at random among those other than `current`.
    ///
    /// Falls back to any proxy when `current` is the only member.
    pub fn choose_other(&self, current: &ProxyEndpoint) -> Option<Arc<ProxyEndpoint>> {
        let others: Vec<&Arc<ProxyEndpoint>> = self
            .proxies
            .iter()
            .filter(|p| !std::ptr::eq(Arc::as_ptr(p), current))
            .collect();
        match others.choose(&mut rand::thread_rng()) {
            Some(proxy) => Some(Arc::clone(proxy)),
            None => self.choose(),
        }
    }

    /// Iterates over the pooled proxies.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProxyEndpoint>> {
        self.proxies.iter()
    }
}
