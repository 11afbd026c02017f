//! Discovered domain type and link normalization.

use std::fmt;

use serde::Serialize;
use tracing::debug;
use url::Url;

/// Hosts never reported as results, whichever engine produced the link.
const EXCLUDED_HOSTS: &[&str] = &["bing.com"];

/// A normalized hostname extracted from a result link.
///
/// Always lowercase, never empty, never carrying a `www.` prefix, and made
/// only of ASCII letters, digits, dots and hyphens. Only [`Domain::from_link`]
/// builds one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Normalizes a raw link into a domain.
    ///
    /// Trailing garbage after the first whitespace or breadcrumb separator is
    /// cut off before parsing. Returns `None` when the link has no usable host
    /// or when `is_excluded` reports the host as self-referential.
    pub fn from_link(raw: &str, is_excluded: impl Fn(&str) -> bool) -> Option<Self> {
        let cleaned = raw
            .split_whitespace()
            .next()?
            .split('\u{203a}')
            .next()?;

        let parsed = match Url::parse(cleaned) {
            Ok(url) => url,
            Err(e) => {
                debug!("Failed to extract domain from {}: {}", raw, e);
                return None;
            }
        };

        let host = parsed.host_str()?.to_lowercase();
        let mut host = host.as_str();
        while let Some(rest) = host.strip_prefix("www.") {
            host = rest;
        }
        let host = host.trim_end_matches('.');
        if host.is_empty() {
            debug!("Empty hostname after extraction from {}", raw);
            return None;
        }
        if !is_hostname(host) {
            debug!("Rejected malformed hostname '{}' from {}", host, raw);
            return None;
        }

        if is_excluded_host(host) || is_excluded(host) {
            return None;
        }

        Some(Self(host.to_string()))
    }

    /// Returns the domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the domain, returning the hostname.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true if `host` equals `suffix` or is a subdomain of it.
pub(crate) fn host_matches(host: &str, suffix: &str) -> bool {
    host == suffix
        || host
            .strip_suffix(suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// ASCII letters, digits, dots and hyphens; IDNs arrive here already punycoded.
fn is_hostname(host: &str) -> bool {
    host.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
}

fn is_excluded_host(host: &str) -> bool {
    EXCLUDED_HOSTS.iter().any(|h| host_matches(host, h))
}
