//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Discovering the public IP via IpSource
//! - Listing the zone's records via ZoneApi
//! - Writing the IP into every listed record via ZoneApi
//! - Reporting one outcome per record, in listing order
//!
//! ## State Machine
//!
//! ```text
//! Idle ──► IpResolved ──► RecordsListed ──► UpdatingRecords ──► Done
//!  │            │
//!  └── Aborted ◄┘   (unknown IP, listing failure)
//! ```
//!
//! Per-record update failures never abort a run: the update phase always
//! reaches `Done`, even when every update failed.

use crate::config::ReconcileConfig;
use crate::error::{Error, Result};
use crate::model::{ApiMessage, DnsRecord, ResultInfo, UpdateOutcome};
use crate::traits::{IpResolution, IpSource, ZoneApi};
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Phase of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    IpResolved,
    RecordsListed,
    UpdatingRecords,
    Done,
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::IpResolved => "ip-resolved",
            RunState::RecordsListed => "records-listed",
            RunState::UpdatingRecords => "updating-records",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// The run moved to another phase
    Transition { from: RunState, to: RunState },

    /// Public IP discovered
    IpResolved { ip: String },

    /// Records enumerated
    RecordsListed {
        count: usize,
        result_info: Option<ResultInfo>,
    },

    /// A record update was accepted
    UpdateSucceeded {
        record_id: String,
        record_name: String,
        status: Option<u16>,
    },

    /// A record update was rejected or never answered
    UpdateFailed {
        record_id: String,
        record_name: String,
        status: Option<u16>,
        error: Option<String>,
    },

    /// The run stopped at a gate
    Aborted { reason: String },

    /// The update phase finished
    Finished { succeeded: usize, failed: usize },
}

/// Outcome of a run that reached `Done`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Zone the run reconciled
    pub zone_id: String,
    /// Address written into every record
    pub ip: String,
    /// One entry per listed record, in listing order
    pub outcomes: Vec<UpdateOutcome>,
    /// Pagination metadata of the listing (display only)
    pub result_info: Option<ResultInfo>,
    /// `messages` returned with the listing
    pub messages: Vec<ApiMessage>,
}

impl ReconcileReport {
    /// Number of successful updates
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Number of failed updates
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether every update succeeded (vacuously true for an empty zone)
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    /// Outcomes of the failed updates, in listing order
    pub fn failures(&self) -> impl Iterator<Item = &UpdateOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

/// Reconciles the records of one zone with the public IP
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::reconcile()`] once per run
/// 3. Drop to release the IP source and zone API (and their transport)
///
/// Events are published on a bounded channel; when it is full, events are
/// dropped with a warning instead of blocking the run.
pub struct Reconciler {
    /// Public IP discovery
    ip_source: Box<dyn IpSource>,

    /// Record listing and updates
    api: Box<dyn ZoneApi>,

    /// Zone to reconcile
    zone_id: String,

    /// Updates allowed in flight at once
    max_concurrent_updates: usize,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// reconcile events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        api: Box<dyn ZoneApi>,
        config: &ReconcileConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            ip_source,
            api,
            zone_id: config.location.clone(),
            max_concurrent_updates: config.max_concurrent_updates,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Run one reconciliation
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: the run reached `Done`; inspect the report
    ///   for per-record failures
    /// - `Err(Error::UnknownIp)`: aborted, no zone API call was made
    /// - `Err(Error::List | Error::Parse | Error::Http)`: aborted, no update
    ///   was attempted
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut state = RunState::Idle;

        debug!("Resolving public IP via {}", self.ip_source.source_name());
        let ip = match self.ip_source.resolve().await {
            IpResolution::Known(ip) => ip,
            IpResolution::Unknown { reason } => {
                return Err(self.abort(state, Error::unknown_ip(reason)));
            }
        };
        info!("my ip is {}", ip);
        self.emit_event(ReconcileEvent::IpResolved { ip: ip.clone() });
        state = self.transition(state, RunState::IpResolved);

        debug!(
            "Listing records of zone {} via {}",
            self.zone_id,
            self.api.provider_name()
        );
        let listing = match self.api.list_records(&self.zone_id).await {
            Ok(listing) => listing,
            Err(e) => return Err(self.abort(state, e)),
        };

        if !listing.success {
            warn!(
                "Listing for zone {} answered 2xx with success=false; updating listed records anyway",
                self.zone_id
            );
        }

        if let Some(info) = listing.result_info.filter(ResultInfo::has_more) {
            warn!(
                "Zone {} has {} records; only page {} ({} records) is reconciled",
                self.zone_id, info.total_count, info.page, info.count
            );
        }

        info!(
            "Got {} DNS record(s) for zone {}",
            listing.result.len(),
            self.zone_id
        );
        self.emit_event(ReconcileEvent::RecordsListed {
            count: listing.result.len(),
            result_info: listing.result_info,
        });
        state = self.transition(state, RunState::RecordsListed);

        state = self.transition(state, RunState::UpdatingRecords);
        let outcomes = self.update_all(&listing.result, &ip).await;

        let report = ReconcileReport {
            zone_id: self.zone_id.clone(),
            ip,
            outcomes,
            result_info: listing.result_info,
            messages: listing.messages.unwrap_or_default(),
        };

        info!(
            "Reconciled zone {}: {} updated, {} failed",
            self.zone_id,
            report.succeeded(),
            report.failed()
        );
        self.emit_event(ReconcileEvent::Finished {
            succeeded: report.succeeded(),
            failed: report.failed(),
        });
        self.transition(state, RunState::Done);

        Ok(report)
    }

    /// Update every record with the resolved IP
    ///
    /// Outcomes are returned in the order of `records`, whatever the
    /// concurrency.
    async fn update_all(&self, records: &[DnsRecord], ip: &str) -> Vec<UpdateOutcome> {
        stream::iter(records)
            .map(|record| self.update_one(record, ip))
            .buffered(self.max_concurrent_updates)
            .collect()
            .await
    }

    /// Perform a single record update
    ///
    /// The update is issued even when the record already holds `ip`.
    async fn update_one(&self, record: &DnsRecord, ip: &str) -> UpdateOutcome {
        debug!(
            "Updating {} ({}) {} -> {}",
            record.name, record.id, record.content, ip
        );

        let outcome = self.api.update_record(&self.zone_id, record, ip).await;

        if outcome.success {
            info!("ip address for {} updated", outcome.record_name);
            self.emit_event(ReconcileEvent::UpdateSucceeded {
                record_id: outcome.record_id.clone(),
                record_name: outcome.record_name.clone(),
                status: outcome.status,
            });
        } else {
            warn!(
                "Failed to update {} ({}): status={:?} error={}",
                outcome.record_name,
                outcome.record_id,
                outcome.status,
                outcome.error.as_deref().unwrap_or("-")
            );
            self.emit_event(ReconcileEvent::UpdateFailed {
                record_id: outcome.record_id.clone(),
                record_name: outcome.record_name.clone(),
                status: outcome.status,
                error: outcome.error.clone(),
            });
        }

        outcome
    }

    /// Move to `to`, logging and emitting the transition
    fn transition(&self, from: RunState, to: RunState) -> RunState {
        debug!("Reconcile state: {} -> {}", from, to);
        self.emit_event(ReconcileEvent::Transition { from, to });
        to
    }

    /// Stop the run at the current gate
    fn abort(&self, state: RunState, err: Error) -> Error {
        error!("Reconciliation of zone {} aborted: {}", self.zone_id, err);
        self.emit_event(ReconcileEvent::Aborted {
            reason: err.to_string(),
        });
        self.transition(state, RunState::Aborted);
        err
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        // Full channel: the consumer is slower than the run; drop rather than block
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
