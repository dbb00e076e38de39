// # Cloudflare Zone API
//
// This crate provides the Cloudflare API v4 implementation of
// `cfsync_core::ZoneApi`.
//
// ## Behavior
//
// - One HTTP request per call, no retry, no backoff
// - Listing: non-2xx is a fatal `Error::List` carrying the status, the raw
//   body and the decoded `errors` array
// - Update: success is the 2xx status class, nothing else; failures are
//   returned as unsuccessful outcomes, never as errors
// - Unknown response fields are ignored
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfsync_core::config::{ApiToken, ReconcileConfig};
use cfsync_core::model::{ApiMessage, DnsRecord, RecordListResult, RecordUpdatePayload, UpdateOutcome};
use cfsync_core::traits::ZoneApi;
use cfsync_core::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the pooled HTTP client shared by every request of a run
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// Cloudflare zone API client
///
/// Holds the credential and a handle on the pooled HTTP client. Cloning a
/// `reqwest::Client` shares its connection pool, so the same transport can
/// be handed to the IP source as well.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: ApiToken,

    /// Zones endpoint, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Lenient view of an error body: only the `errors` array matters
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Option<Vec<ApiMessage>>,
}

impl CloudflareProvider {
    /// Create a new Cloudflare client
    ///
    /// # Parameters
    ///
    /// - `client`: Shared HTTP client
    /// - `api_base`: Zones endpoint (e.g. `https://api.cloudflare.com/client/v4/zones`)
    /// - `api_token`: Token with Zone:DNS:Edit permission
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, api_token: ApiToken) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();

        Self {
            api_token,
            api_base,
            client,
        }
    }

    /// Create a client from a run configuration
    pub fn from_config(client: reqwest::Client, config: &ReconcileConfig) -> Self {
        Self::new(client, config.api_base.clone(), config.token.clone())
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// Decode the `errors` array of a failure body, if there is one
    fn decode_errors(body: &str) -> Vec<ApiMessage> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.errors)
            .unwrap_or_default()
    }
}

/// Human hint for a failure status
fn status_hint(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad request: the API rejected the payload",
        401 | 403 => "Authentication failed: invalid API token or insufficient permissions",
        404 => "Not found: unknown zone or record",
        409 => "Conflict: record is being updated by another process",
        429 => "Rate limit exceeded",
        500..=599 => "Cloudflare server error (transient)",
        _ => "Unexpected status",
    }
}

#[async_trait]
impl ZoneApi for CloudflareProvider {
    /// List the first page of records of a zone
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<RecordListResult> {
        let url = self.records_url(zone_id);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token.expose())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        tracing::debug!("Response Status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;
        tracing::debug!("Response Body: {}", body);

        if !status.is_success() {
            tracing::error!(
                "Error getting DNS records for zone {}: {} ({})",
                zone_id,
                status,
                status_hint(status)
            );
            let errors = Self::decode_errors(&body);
            return Err(Error::list(status.as_u16(), body, errors));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::parse(format!("{}. Response: {}", e, body)))
    }

    /// Overwrite the content of one record
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    ///
    /// { "content": "203.0.113.5" }
    /// ```
    async fn update_record(&self, zone_id: &str, record: &DnsRecord, content: &str) -> UpdateOutcome {
        let url = self.record_url(zone_id, &record.id);
        tracing::debug!("PATCH {} ({})", url, record.name);

        let payload = RecordUpdatePayload::new(content);

        let response = match self
            .client
            .patch(&url)
            .bearer_auth(self.api_token.expose())
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return UpdateOutcome::transport_failure(record, format!("HTTP request failed: {}", e));
            }
        };

        let status = response.status();
        tracing::debug!("Response Status: {} ({})", status, record.name);

        let outcome = UpdateOutcome::from_status(record, status.as_u16());
        if outcome.success {
            return outcome;
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        outcome.with_error(format!("{} - {}", status_hint(status), body))
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
