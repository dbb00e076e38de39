//! Error types for cfsync
//!
//! Only run-fatal failures are errors. A failed PATCH for a single record is
//! captured as an unsuccessful [`UpdateOutcome`](crate::model::UpdateOutcome)
//! and never shows up here.

use crate::model::ApiMessage;
use thiserror::Error;

/// Result type alias for cfsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cfsync
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (raised before any network activity)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public IP discovery produced no usable address
    #[error("Unknown IP: {reason}")]
    UnknownIp {
        /// Why discovery failed (missing `ip=` line, transport failure, ...)
        reason: String,
    },

    /// Record enumeration returned a non-2xx status
    #[error("Listing DNS records failed with HTTP {status}: {}", summarize(.errors, .body))]
    List {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
        /// Decoded `errors` array from the body, empty if it could not be decoded
        errors: Vec<ApiMessage>,
    },

    /// Malformed JSON on a success-status body
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Transport-level failure (connect, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unknown IP error
    pub fn unknown_ip(reason: impl Into<String>) -> Self {
        Self::UnknownIp {
            reason: reason.into(),
        }
    }

    /// Create a listing error
    pub fn list(status: u16, body: impl Into<String>, errors: Vec<ApiMessage>) -> Self {
        Self::List {
            status,
            body: body.into(),
            errors,
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

fn summarize(errors: &[ApiMessage], body: &str) -> String {
    if errors.is_empty() {
        return body.to_string();
    }

    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
