// # Trace IP Source
//
// This crate discovers the caller's public IP address from a plaintext
// trace endpoint (by default `https://cloudflare.com/cdn-cgi/trace`).
//
// ## Response Format
//
// ```text
// fl=29f123
// h=cloudflare.com
// ip=203.0.113.5
// ts=1700000000.123
// loc=XX
// ```
//
// The first line whose key is exactly `ip` carries the address. Any failure
// (transport, non-2xx, no `ip=` line) resolves to the unknown sentinel
// instead of an error; the cause is kept as the reason.

use cfsync_core::config::DEFAULT_TRACE_URL;
use cfsync_core::traits::{IpResolution, IpSource};
use std::time::Duration;

/// Default timeout for trace requests
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Extract the `ip` value from a trace body
///
/// Lines are scanned in order; the first line whose key is exactly `ip`
/// wins. Keys like `ipv6` do not match. An empty value counts as absent.
pub fn parse_trace(body: &str) -> Option<&str> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "ip")
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Trace-endpoint IP source
pub struct TraceIpSource {
    /// URL to fetch the trace from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl TraceIpSource {
    /// Create a trace source with its own HTTP client
    ///
    /// # Parameters
    ///
    /// - `url`: Trace URL (e.g., "https://cloudflare.com/cdn-cgi/trace")
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a trace source on a shared HTTP client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Fetch the raw trace body
    async fn fetch_trace(&self) -> Result<String, String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))
    }
}

impl Default for TraceIpSource {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_URL)
    }
}

#[async_trait::async_trait]
impl IpSource for TraceIpSource {
    async fn resolve(&self) -> IpResolution {
        tracing::debug!("GET {}", self.url);

        let body = match self.fetch_trace().await {
            Ok(body) => body,
            Err(reason) => {
                tracing::warn!("Trace request to {} failed: {}", self.url, reason);
                return IpResolution::unknown(reason);
            }
        };

        match parse_trace(&body) {
            Some(ip) => IpResolution::Known(ip.to_string()),
            None => {
                tracing::warn!("Trace response from {} has no ip= line", self.url);
                IpResolution::unknown("no ip= line in trace response")
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "trace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trace_finds_ip_line() {
        assert_eq!(parse_trace("ip=203.0.113.5\nloc=XX"), Some("203.0.113.5"));
        assert_eq!(
            parse_trace("fl=29f123\nh=cloudflare.com\nip=2001:db8::1\nts=1700000000.1"),
            Some("2001:db8::1")
        );
    }

    #[test]
    fn test_parse_trace_without_ip_line() {
        assert_eq!(parse_trace("warp=off"), None);
        assert_eq!(parse_trace(""), None);
        assert_eq!(parse_trace("ip"), None);
    }

    #[test]
    fn test_parse_trace_requires_exact_key() {
        assert_eq!(parse_trace("ipv6=2001:db8::1\nip=203.0.113.5"), Some("203.0.113.5"));
        assert_eq!(parse_trace("ipv6=2001:db8::1"), None);
        assert_eq!(parse_trace("vip=1.2.3.4"), None);
    }

    #[test]
    fn test_parse_trace_first_match_wins() {
        assert_eq!(parse_trace("ip=1.1.1.1\nip=2.2.2.2"), Some("1.1.1.1"));
    }

    #[test]
    fn test_parse_trace_handles_crlf_and_empty_value() {
        assert_eq!(parse_trace("h=x\r\nip=203.0.113.5\r\n"), Some("203.0.113.5"));
        assert_eq!(parse_trace("ip=\nloc=XX"), None);
    }

    #[test]
    fn test_source_name() {
        assert_eq!(TraceIpSource::default().source_name(), "trace");
    }
}
