// # Zone API Trait
//
// Defines the record operations cfsync needs from a DNS provider: list the
// records of a zone and overwrite the content of one record.
//
// ## Implementations
//
// - Cloudflare API v4: `cfsync-provider-cloudflare` crate

use crate::model::{DnsRecord, RecordListResult, UpdateOutcome};
use async_trait::async_trait;

/// Trait for zone record APIs
///
/// Implementations hold their own credential and transport, and make exactly
/// one HTTP request per call.
///
/// # Failure model
///
/// - [`list_records`](ZoneApi::list_records) failures are fatal to a run and
///   are returned as errors.
/// - [`update_record`](ZoneApi::update_record) never fails: a rejected or
///   unreachable update is an unsuccessful [`UpdateOutcome`], so one record's
///   failure cannot stop the others.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// Fetch the first page of records for a zone
    ///
    /// # Returns
    ///
    /// - `Ok(RecordListResult)`: 2xx response, decoded
    /// - `Err(Error::List)`: non-2xx response
    /// - `Err(Error::Parse)`: 2xx response with a malformed body
    /// - `Err(Error::Http)`: no response
    async fn list_records(&self, zone_id: &str) -> Result<RecordListResult, crate::Error>;

    /// Overwrite the content of one record
    ///
    /// Success is decided by the response status class alone.
    async fn update_record(&self, zone_id: &str, record: &DnsRecord, content: &str)
    -> UpdateOutcome;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
