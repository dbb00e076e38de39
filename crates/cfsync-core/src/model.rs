//! Wire and report types
//!
//! These mirror the Cloudflare API v4 `dns_records` schema. Deserialization
//! ignores unknown fields, and fields that older consumers never saw
//! (`tags`, `settings`, `comment`, `proxiable`) fall back to defaults so a
//! minimal record still parses into [`DnsRecord`].

use serde::{Deserialize, Serialize};

/// A DNS record within a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Zone-scoped record identifier
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type (A, AAAA, CNAME, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content, the only field cfsync writes
    pub content: String,
    /// Time-to-live (1 = automatic)
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub proxiable: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub settings: Option<RecordSettings>,
}

/// Per-record settings flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSettings {
    #[serde(default)]
    pub ipv4_only: Option<bool>,
    #[serde(default)]
    pub ipv6_only: Option<bool>,
}

/// An entry of the `errors` or `messages` arrays of an API response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub source: Option<MessageSource>,
}

/// Pointer to the part of the request an [`ApiMessage`] refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSource {
    #[serde(default)]
    pub pointer: Option<String>,
}

/// Pagination metadata of a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_count: u32,
}

impl ResultInfo {
    /// Whether records exist beyond the page that was returned
    pub fn has_more(&self) -> bool {
        self.total_count > self.count && self.page.saturating_mul(self.per_page) < self.total_count
    }
}

/// Body of `GET /zones/{zone_id}/dns_records`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordListResult {
    pub success: bool,
    #[serde(default)]
    pub result: Vec<DnsRecord>,
    #[serde(default)]
    pub errors: Option<Vec<ApiMessage>>,
    #[serde(default)]
    pub messages: Option<Vec<ApiMessage>>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

/// Body of `PATCH /zones/{zone_id}/dns_records/{record_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdatePayload {
    pub content: String,
}

impl RecordUpdatePayload {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Result of a single record update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Record the update targeted
    pub record_id: String,
    /// Record name, for display
    pub record_name: String,
    /// `true` iff the PATCH answered with a 2xx status
    pub success: bool,
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    /// Diagnostic text for failures
    pub error: Option<String>,
}

impl UpdateOutcome {
    /// Build an outcome from a response status
    pub fn from_status(record: &DnsRecord, status: u16) -> Self {
        Self {
            record_id: record.id.clone(),
            record_name: record.name.clone(),
            success: (200..=299).contains(&status),
            status: Some(status),
            error: None,
        }
    }

    /// Build a failed outcome for a request that never got a response
    pub fn transport_failure(record: &DnsRecord, error: impl Into<String>) -> Self {
        Self {
            record_id: record.id.clone(),
            record_name: record.name.clone(),
            success: false,
            status: None,
            error: Some(error.into()),
        }
    }

    /// Attach diagnostic text
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
