//! Supported search engines.
//!
//! Engines form a closed set. Each variant pairs a query-parameter builder with
//! a result extractor and knows which hosts on its result pages are its own.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::engines::{BingExtractor, DuckDuckGoExtractor, GoogleExtractor, ResultExtractor};
use crate::result::host_matches;
use crate::{DorkError, Result};

static GOOGLE_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|\.)google\.[a-z]{2,3}(\.[a-z]{2})?$").expect("valid google host pattern")
});

/// A search engine dorks can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Google,
    Bing,
    DuckDuckGo,
}

impl Engine {
    /// All supported engines.
    pub const ALL: [Engine; 3] = [Engine::Google, Engine::Bing, Engine::DuckDuckGo];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Engine::Google => "google",
            Engine::Bing => "bing",
            Engine::DuckDuckGo => "duckduckgo",
        }
    }

    /// Base URL of the HTML results page.
    pub fn base_url(&self) -> &'static str {
        match self {
            Engine::Google => "https://www.google.com/search",
            Engine::Bing => "https://www.bing.com/search",
            Engine::DuckDuckGo => "https://duckduckgo.com/html/",
        }
    }

    /// Query parameters for a zero-based page of results.
    pub fn params(&self, dork: &str, page: u32) -> Vec<(&'static str, String)> {
        match self {
            Engine::Google => vec![("q", dork.to_string()), ("start", (page * 10).to_string())],
            Engine::Bing => vec![("q", dork.to_string()), ("first", (page * 10 + 1).to_string())],
            Engine::DuckDuckGo => vec![("q", dork.to_string()), ("s", (page * 30).to_string())],
        }
    }

    /// Builds the full results URL for a dork and zero-based page.
    pub fn search_url(&self, dork: &str, page: u32) -> Result<Url> {
        Ok(Url::parse_with_params(self.base_url(), self.params(dork, page))?)
    }

    /// Lowercase substrings that mark a bot-check or CAPTCHA page.
    pub fn block_markers(&self) -> &'static [&'static str] {
        match self {
            Engine::Google => &["detected unusual traffic", "captcha", "/sorry/index"],
            Engine::Bing => &["unusual traffic", "captcha"],
            Engine::DuckDuckGo => &["robot check", "captcha"],
        }
    }

    /// Returns true if the page body looks like a block page.
    pub fn is_blocked(&self, body: &str) -> bool {
        let lower = body.to_lowercase();
        self.block_markers().iter().any(|m| lower.contains(m))
    }

    /// Returns true if `host` belongs to the engine itself.
    pub fn is_self_host(&self, host: &str) -> bool {
        match self {
            Engine::Google => {
                GOOGLE_HOST.is_match(host)
                    || ["gstatic.com", "googleapis.com", "googleusercontent.com"]
                        .iter()
                        .any(|h| host_matches(host, h))
            }
            Engine::Bing => host_matches(host, "bing.com") || host_matches(host, "bing.net"),
            Engine::DuckDuckGo => host_matches(host, "duckduckgo.com"),
        }
    }

    /// Returns the built-in extractor for this engine's result markup.
    pub fn extractor(&self) -> Box<dyn ResultExtractor> {
        match self {
            Engine::Google => Box::new(GoogleExtractor),
            Engine::Bing => Box::new(BingExtractor),
            Engine::DuckDuckGo => Box::new(DuckDuckGoExtractor),
        }
    }

    /// Parses a comma-separated engine selection.
    ///
    /// Unknown names are dropped with a warning and duplicates collapse. An
    /// empty result falls back to Google.
    pub fn parse_list(selection: &str) -> Vec<Engine> {
        let mut engines = Vec::new();
        for name in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.parse::<Engine>() {
                Ok(engine) if !engines.contains(&engine) => engines.push(engine),
                Ok(_) => {}
                Err(_) => warn!("Unknown engine '{}', skipping", name),
            }
        }
        if engines.is_empty() {
            engines.push(Engine::Google);
        }
        engines
    }
}

impl FromStr for Engine {
    type Err = DorkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" | "g" => Ok(Engine::Google),
            "bing" => Ok(Engine::Bing),
            "duckduckgo" | "ddg" => Ok(Engine::DuckDuckGo),
            other => Err(DorkError::Config(format!("unknown engine '{}'", other))),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
