//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles record every call in a shared [`CallLog`] so tests can
//! assert on call counts and order after handing the doubles to the
//! Reconciler.

#![allow(dead_code)]

use cfsync_core::{
    ApiMessage, ApiToken, DnsRecord, Error, IpResolution, IpSource, ReconcileConfig,
    ReconcileEvent, RecordListResult, ResultInfo, UpdateOutcome, ZoneApi,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Shared record of calls made against the doubles
#[derive(Default)]
pub struct CallLog {
    resolve_calls: AtomicUsize,
    list_calls: AtomicUsize,
    /// (record_id, content) of every update, in call order
    updates: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Total calls against the zone API (list + update)
    pub fn zone_api_calls(&self) -> usize {
        self.list_calls() + self.update_calls()
    }

    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// An IP source returning a fixed resolution
pub struct StaticIpSource {
    resolution: IpResolution,
    log: Arc<CallLog>,
}

impl StaticIpSource {
    pub fn known(ip: &str, log: &Arc<CallLog>) -> Self {
        Self {
            resolution: IpResolution::Known(ip.to_string()),
            log: log.clone(),
        }
    }

    pub fn unknown(reason: &str, log: &Arc<CallLog>) -> Self {
        Self {
            resolution: IpResolution::unknown(reason),
            log: log.clone(),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn resolve(&self) -> IpResolution {
        self.log.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.resolution.clone()
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Scripted listing response
pub enum Listing {
    Records(Vec<DnsRecord>),
    Status {
        status: u16,
        errors: Vec<ApiMessage>,
    },
}

/// A zone API double with a scripted listing and per-record PATCH statuses
pub struct MockZoneApi {
    listing: Listing,
    /// Status per record id; records not in the map answer 200
    statuses: HashMap<String, u16>,
    /// Per-record artificial latency, to shake out ordering under concurrency
    delays: HashMap<String, Duration>,
    log: Arc<CallLog>,
}

impl MockZoneApi {
    pub fn listing(records: Vec<DnsRecord>, log: &Arc<CallLog>) -> Self {
        Self {
            listing: Listing::Records(records),
            statuses: HashMap::new(),
            delays: HashMap::new(),
            log: log.clone(),
        }
    }

    pub fn failing_listing(status: u16, errors: Vec<ApiMessage>, log: &Arc<CallLog>) -> Self {
        Self {
            listing: Listing::Status { status, errors },
            statuses: HashMap::new(),
            delays: HashMap::new(),
            log: log.clone(),
        }
    }

    /// Make the PATCH for `record_id` answer `status`
    pub fn with_status(mut self, record_id: &str, status: u16) -> Self {
        self.statuses.insert(record_id.to_string(), status);
        self
    }

    /// Delay the PATCH for `record_id`
    pub fn with_delay(mut self, record_id: &str, delay: Duration) -> Self {
        self.delays.insert(record_id.to_string(), delay);
        self
    }
}

#[async_trait::async_trait]
impl ZoneApi for MockZoneApi {
    async fn list_records(&self, _zone_id: &str) -> Result<RecordListResult, Error> {
        self.log.list_calls.fetch_add(1, Ordering::SeqCst);

        match &self.listing {
            Listing::Records(records) => Ok(RecordListResult {
                success: true,
                result: records.clone(),
                errors: Some(Vec::new()),
                messages: Some(Vec::new()),
                result_info: Some(ResultInfo {
                    count: records.len() as u32,
                    page: 1,
                    per_page: 100,
                    total_count: records.len() as u32,
                }),
            }),
            Listing::Status { status, errors } => Err(Error::list(
                *status,
                serde_json::json!({ "success": false, "errors": errors }).to_string(),
                errors.clone(),
            )),
        }
    }

    async fn update_record(&self, _zone_id: &str, record: &DnsRecord, content: &str) -> UpdateOutcome {
        self.log
            .updates
            .lock()
            .unwrap()
            .push((record.id.clone(), content.to_string()));

        let now = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&record.id) {
            tokio::time::sleep(*delay).await;
        }

        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);

        let status = self.statuses.get(&record.id).copied().unwrap_or(200);
        UpdateOutcome::from_status(record, status)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build an A record
pub fn record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: "A".to_string(),
        content: content.to_string(),
        ttl: 1,
        proxied: false,
        proxiable: true,
        tags: Vec::new(),
        comment: None,
        settings: None,
    }
}

/// Minimal valid configuration
pub fn test_config() -> ReconcileConfig {
    ReconcileConfig::new("zone123", ApiToken::new("test_token"))
}

/// Drain every event currently buffered in the channel
pub fn drain_events(rx: &mut mpsc::Receiver<ReconcileEvent>) -> Vec<ReconcileEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The `to` states of every transition event, in order
pub fn transitions(events: &[ReconcileEvent]) -> Vec<cfsync_core::RunState> {
    events
        .iter()
        .filter_map(|e| match e {
            ReconcileEvent::Transition { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}
