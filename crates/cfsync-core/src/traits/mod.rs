//! Core traits for cfsync
//!
//! - [`IpSource`]: Discover the public IP address
//! - [`ZoneApi`]: List and update DNS records of a zone

pub mod ip_source;
pub mod zone_api;

pub use ip_source::{IpResolution, IpSource, UNKNOWN_IP_SENTINEL};
pub use zone_api::ZoneApi;
