//! Operator files: dork list, proxy list and the results file.

use std::path::Path;
use std::time::Duration;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::proxy::{ProxyEndpoint, SENTINEL_PROXY};
use crate::{Domain, DorkError, Result};

/// Splits raw file content into trimmed, non-blank lines.
///
/// Lines that are not valid UTF-8 are skipped with a warning.
fn text_lines(content: &[u8]) -> impl Iterator<Item = &str> {
    content
        .split(|b| *b == b'\n')
        .enumerate()
        .filter_map(|(index, line)| match std::str::from_utf8(line) {
            Ok(line) => Some(line.trim()),
            Err(e) => {
                warn!("Skipping line {}: not valid UTF-8 ({})", index + 1, e);
                None
            }
        })
        .filter(|line| !line.is_empty())
}

/// Returns the trimmed, non-blank lines of a dork list.
pub fn parse_dorks(content: impl AsRef<[u8]>) -> Vec<String> {
    text_lines(content.as_ref()).map(str::to_string).collect()
}

/// Parses a proxy list, skipping blanks, the sentinel and malformed lines.
pub fn parse_proxies(content: impl AsRef<[u8]>, timeout: Duration) -> Vec<ProxyEndpoint> {
    text_lines(content.as_ref())
        .filter(|line| *line != SENTINEL_PROXY)
        .filter_map(|line| match ProxyEndpoint::parse_with_timeout(line, timeout) {
            Ok(proxy) => Some(proxy),
            Err(e) => {
                warn!("Skipping proxy line: {}", e);
                None
            }
        })
        .collect()
}

/// Loads the dork list.
///
/// A missing file is a configuration error and an empty one is
/// [`DorkError::NoDorks`].
pub async fn load_dorks(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read(path).await.map_err(|e| {
        DorkError::Config(format!("dork file '{}' not readable: {}", path.display(), e))
    })?;

    let dorks = parse_dorks(content);
    if dorks.is_empty() {
        return Err(DorkError::NoDorks);
    }
    info!("Loaded {} dorks from '{}'", dorks.len(), path.display());
    Ok(dorks)
}

/// Loads the proxy list, building one client per entry.
///
/// A missing file is a configuration error; a file without usable entries
/// yields an empty list for the caller to judge.
pub async fn load_proxies(path: impl AsRef<Path>, timeout: Duration) -> Result<Vec<ProxyEndpoint>> {
    let path = path.as_ref();
    let content = fs::read(path).await.map_err(|e| {
        DorkError::Config(format!("proxy file '{}' not readable: {}", path.display(), e))
    })?;

    let proxies = parse_proxies(content, timeout);
    info!("Loaded {} proxies from '{}'", proxies.len(), path.display());
    Ok(proxies)
}

/// Appends domains to `path`, one per line, creating the file if needed.
///
/// Returns the number of lines written.
pub async fn append_results(path: impl AsRef<Path>, domains: &[Domain]) -> Result<usize> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let mut buffer = String::new();
    for domain in domains {
        buffer.push_str(domain.as_str());
        buffer.push('\n');
    }
    file.write_all(buffer.as_bytes()).await?;
    file.flush().await?;

    info!("Saved {} domains to '{}'", domains.len(), path.display());
    Ok(domains.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::DEFAULT_PROXY_TIMEOUT;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn domain(host: &str) -> Domain {
        Domain::from_link(&format!("https://{}", host), |_| false).unwrap()
    }

    fn temp_with(content: impl AsRef<[u8]>) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_ref()).unwrap();
        file
    }

    #[test]
    fn test_parse_dorks() {
        let dorks = parse_dorks("inurl:admin\n\n  site:example.com ext:sql  \r\n\t\n");
        assert_eq!(dorks, vec!["inurl:admin", "site:example.com ext:sql"]);
    }

    #[test]
    fn test_parse_proxies_skips_sentinel_and_garbage() {
        let content = "10.0.0.1:8080\n\n0.0.0.0:80\nnot a proxy\nuser:pw@10.0.0.2:3128\n";
        let proxies = parse_proxies(content, DEFAULT_PROXY_TIMEOUT);
        let raw: Vec<&str> = proxies.iter().map(|p| p.raw()).collect();
        assert_eq!(raw, vec!["10.0.0.1:8080", "user:pw@10.0.0.2:3128"]);
    }

    #[test]
    fn test_parse_proxies_only_sentinel() {
        let proxies = parse_proxies("\n0.0.0.0:80\n   \n0.0.0.0:80\n", DEFAULT_PROXY_TIMEOUT);
        assert!(proxies.is_empty());
    }

    #[tokio::test]
    async fn test_load_dorks() {
        let file = temp_with("a\nb\n");
        assert_eq!(load_dorks(file.path()).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_load_dorks_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dorks(dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(DorkError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_dorks_empty_file() {
        let file = temp_with("\n   \n");
        assert!(matches!(load_dorks(file.path()).await, Err(DorkError::NoDorks)));
    }

    #[tokio::test]
    async fn test_load_proxies() {
        let file = temp_with("10.0.0.1:8080\n0.0.0.0:80\n");
        let proxies = load_proxies(file.path(), DEFAULT_PROXY_TIMEOUT).await.unwrap();
        assert_eq!(proxies.len(), 1);
    }

    #[test]
    fn test_parse_proxies_skips_invalid_utf8_lines() {
        let content = b"10.0.0.1:8080\n\xff\xfe garbage\n10.0.0.2:8080\r\n";
        let proxies = parse_proxies(content, DEFAULT_PROXY_TIMEOUT);
        let raw: Vec<&str> = proxies.iter().map(|p| p.raw()).collect();
        assert_eq!(raw, vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
    }

    #[tokio::test]
    async fn test_load_proxies_with_invalid_utf8() {
        let file = temp_with(b"10.0.0.1:8080\n\xff\xfe garbage\n10.0.0.2:8080\n");
        let proxies = load_proxies(file.path(), DEFAULT_PROXY_TIMEOUT).await.unwrap();
        assert_eq!(proxies.len(), 2);
    }

    #[tokio::test]
    async fn test_load_dorks_with_invalid_utf8() {
        let file = temp_with(b"inurl:admin\ncaf\xe9\nintitle:caf\xc3\xa9\n");
        let dorks = load_dorks(file.path()).await.unwrap();
        assert_eq!(dorks, vec!["inurl:admin", "intitle:caf\u{e9}"]);
    }

    #[tokio::test]
    async fn test_load_proxies_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_proxies(dir.path().join("proxy.txt"), DEFAULT_PROXY_TIMEOUT).await;
        assert!(matches!(result, Err(DorkError::Config(_))));
    }

    #[test]
    fn test_append_results_appends() {
        let file = temp_with("existing.example\n");
        let written = tokio_test::block_on(append_results(
            file.path(),
            &[domain("a.example"), domain("b.example")],
        ))
        .unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "existing.example\na.example\nb.example\n");
    }

    #[tokio::test]
    async fn test_append_results_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        append_results(&path, &[domain("x.example")]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x.example\n");
    }
}
