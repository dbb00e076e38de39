// # IP Source Trait
//
// Defines the interface for discovering the caller's public IP address.
//
// ## Implementations
//
// - Cloudflare trace endpoint: `cfsync-ip-trace` crate
//
// ## Usage
//
// ```rust,ignore
// use cfsync_core::IpSource;
//
// let source = /* IpSource implementation */;
// match source.resolve().await {
//     IpResolution::Known(ip) => println!("my ip is {}", ip),
//     IpResolution::Unknown { reason } => println!("ip unknown: {}", reason),
// }
// ```

use async_trait::async_trait;

/// Placeholder rendered when discovery found no usable address
pub const UNKNOWN_IP_SENTINEL: &str = "Unknown IP";

/// Outcome of public IP discovery
///
/// Discovery is fail-soft: transport errors and unparseable responses become
/// [`IpResolution::Unknown`] instead of errors. The reason is kept for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpResolution {
    /// The address exactly as reported by the source
    Known(String),
    /// No usable address
    Unknown {
        /// Why discovery failed
        reason: String,
    },
}

impl IpResolution {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    /// The address, or [`UNKNOWN_IP_SENTINEL`]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(ip) => ip,
            Self::Unknown { .. } => UNKNOWN_IP_SENTINEL,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl std::fmt::Display for IpResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for public IP discovery
///
/// Implementations issue a single request per call and never retry.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Discover the current public IP address
    async fn resolve(&self) -> IpResolution;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
