use std::time::Instant;

use tracing::{debug, warn};
use ureq::ResponseExt;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{Result, ScanError};

/// Accept header sent with page fetches
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// Raw page as returned by a fetch
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL the caller asked for
    pub requested_url: String,
    /// Final URL after redirects
    pub final_url: String,
    /// Raw HTML content
    pub html: String,
}

/// Anything that can hand the scanner a page and answer link liveness probes.
///
/// `HttpFetcher` is the network implementation; hosts that already hold the
/// HTML (or tests) can supply their own.
pub trait PageSource {
    /// Fetch one page. Every failure is reported as `ScanError::Unreachable`.
    fn fetch_page(&self, url: &Url) -> Result<RawPage>;

    /// Whether a link answers with a non-error status
    fn link_is_live(&self, url: &str) -> bool;
}

/// Validate a caller-supplied URL before any network call is attempted
pub fn parse_scan_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidUrl("empty URL".into()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScanError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, trimmed
            )))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ScanError::InvalidUrl(format!("{} has no host", trimmed)));
    }

    Ok(url)
}

/// Blocking HTTP implementation of `PageSource`
pub struct HttpFetcher {
    page_agent: ureq::Agent,
    link_agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let page_agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.page_timeout()))
            .build()
            .into();
        let link_agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.link_timeout()))
            .build()
            .into();

        Self {
            page_agent,
            link_agent,
            user_agent: config.user_agent.clone(),
        }
    }

    /// HEAD first; servers that refuse HEAD get a GET
    fn probe(&self, url: &str) -> std::result::Result<u16, ureq::Error> {
        let head = self
            .link_agent
            .head(url)
            .header("User-Agent", self.user_agent.as_str())
            .call();

        match head {
            Ok(response) => Ok(response.status().as_u16()),
            Err(ureq::Error::StatusCode(405)) | Err(ureq::Error::StatusCode(501)) => self
                .link_agent
                .get(url)
                .header("User-Agent", self.user_agent.as_str())
                .call()
                .map(|response| response.status().as_u16()),
            Err(e) => Err(e),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl PageSource for HttpFetcher {
    fn fetch_page(&self, url: &Url) -> Result<RawPage> {
        debug!(url = %url, "fetching page");

        let response = self
            .page_agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", HTML_ACCEPT)
            .call()
            .map_err(|e| {
                warn!(url = %url, error = %e, "page fetch failed");
                ScanError::Unreachable(format!("{}: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "page returned non-success status");
            return Err(ScanError::Unreachable(format!(
                "{} responded with status {}",
                url,
                status.as_u16()
            )));
        }

        let final_url = response.get_uri().to_string();
        let html = response.into_body().read_to_string().map_err(|e| {
            warn!(url = %url, error = %e, "could not read page body");
            ScanError::Unreachable(format!("{}: {}", url, e))
        })?;

        Ok(RawPage {
            requested_url: url.to_string(),
            final_url,
            html,
        })
    }

    fn link_is_live(&self, url: &str) -> bool {
        match self.probe(url) {
            Ok(status) => {
                debug!(url, status, "link checked");
                status < 400
            }
            Err(e) => {
                debug!(url, error = %e, "link broken");
                false
            }
        }
    }
}

/// Outcome of probing a page's links
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkHealth {
    /// Links actually probed
    pub checked: usize,
    /// Probed links that failed
    pub broken: usize,
    /// The failing links, in probe order
    pub broken_urls: Vec<String>,
    /// Candidates left unprobed (cap or deadline)
    pub skipped: usize,
}

impl LinkHealth {
    pub fn live(&self) -> usize {
        self.checked - self.broken
    }
}

/// Probe at most `max_checks` candidates, stopping early once `deadline` passes
pub fn check_links<S: PageSource + ?Sized>(
    source: &S,
    candidates: &[String],
    max_checks: usize,
    deadline: Option<Instant>,
) -> LinkHealth {
    let mut health = LinkHealth::default();

    for (i, link) in candidates.iter().enumerate() {
        if i >= max_checks {
            health.skipped = candidates.len() - i;
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!(remaining = candidates.len() - i, "scan deadline reached, skipping link checks");
            health.skipped = candidates.len() - i;
            break;
        }

        health.checked += 1;
        if !source.link_is_live(link) {
            health.broken += 1;
            health.broken_urls.push(link.clone());
        }
    }

    health
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct EveryThirdBroken {
        calls: Cell<usize>,
    }

    impl PageSource for EveryThirdBroken {
        fn fetch_page(&self, url: &Url) -> Result<RawPage> {
            Err(ScanError::Unreachable(url.to_string()))
        }

        fn link_is_live(&self, _url: &str) -> bool {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            n % 3 != 0
        }
    }

    fn links(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://example.com/{}", i)).collect()
    }

    #[test]
    fn test_parse_scan_url_accepts_http_and_https() {
        assert!(parse_scan_url("http://example.com").is_ok());
        assert!(parse_scan_url("  https://example.com/page?q=1 ").is_ok());
    }

    #[test]
    fn test_parse_scan_url_rejects_other_schemes() {
        for input in ["ftp://example.com", "file:///etc/passwd", "javascript:alert(1)"] {
            let err = parse_scan_url(input).unwrap_err();
            assert_eq!(err.kind(), "invalid_url", "{}", input);
        }
    }

    #[test]
    fn test_parse_scan_url_rejects_garbage() {
        assert!(matches!(parse_scan_url(""), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(parse_scan_url("not a url"), Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_check_links_counts_broken() {
        let source = EveryThirdBroken { calls: Cell::new(0) };
        let health = check_links(&source, &links(9), 25, None);
        assert_eq!(health.checked, 9);
        assert_eq!(health.broken, 3);
        assert_eq!(health.live(), 6);
        assert_eq!(health.skipped, 0);
    }

    #[test]
    fn test_check_links_respects_cap() {
        let source = EveryThirdBroken { calls: Cell::new(0) };
        let health = check_links(&source, &links(40), 25, None);
        assert_eq!(health.checked, 25);
        assert_eq!(health.skipped, 15);
        assert_eq!(source.calls.get(), 25);
    }

    #[test]
    fn test_check_links_stops_at_deadline() {
        let source = EveryThirdBroken { calls: Cell::new(0) };
        let health = check_links(&source, &links(5), 25, Some(Instant::now()));
        assert_eq!(health.checked, 0);
        assert_eq!(health.broken, 0);
        assert_eq!(health.skipped, 5);
    }
}
