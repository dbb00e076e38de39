// # cfsync-core
//
// Core library for reconciling the DNS records of a Cloudflare zone with the
// caller's public IP address.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the public IP address
// - **ZoneApi**: Trait for listing and updating the records of a zone
// - **Reconciler**: Runs one IP discovery → listing → update pass and
//   reports one outcome per record
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Fail Fast at Gates**: Unknown IP or a failed listing stops the run
//    before any record is touched
// 3. **Per-Record Isolation**: A failed update is a value in the report,
//    never an error that stops the remaining updates
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod traits;

// Re-export core types for convenience
pub use config::{ApiToken, ReconcileConfig};
pub use engine::{ReconcileEvent, ReconcileReport, Reconciler, RunState};
pub use error::{Error, Result};
pub use model::{
    ApiMessage, DnsRecord, MessageSource, RecordListResult, RecordSettings, RecordUpdatePayload,
    ResultInfo, UpdateOutcome,
};
pub use traits::{IpResolution, IpSource, UNKNOWN_IP_SENTINEL, ZoneApi};
