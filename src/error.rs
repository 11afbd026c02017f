//! Error types for the dork search library.

use thiserror::Error;

/// Result type alias for dork search operations.
pub type Result<T> = std::result::Result<T, DorkError>;

/// Errors that can occur while preparing or running a dork search.
///
/// Per-attempt search failures (blocked pages, dead proxies, empty pages) are
/// not represented here; they are soft outcomes handled by the retry layer.
#[derive(Error, Debug)]
pub enum DorkError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Reading or writing an operator file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse markup or a selector.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A proxy line could not be parsed.
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    /// Missing or unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No dorks to search for.
    #[error("No dorks to search for")]
    NoDorks,

    /// No usable proxies, either none loaded or none survived validation.
    #[error("No usable proxies available")]
    NoProxies,

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
