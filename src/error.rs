//! Error taxonomy for the enhancement core.
//!
//! Failures are split by when they happen:
//!
//! - [`ConfigurationError`] - detected before any network attempt
//! - [`EnhancementError`] - raised during or after the provider call
//! - [`UnsupportedProtocolError`] - a protocol name outside the known set
//!
//! [`Error`] wraps all three and is what [`crate::enhancer::Enhancer`] returns.

use crate::providers::Protocol;
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid or incomplete configuration. Not retryable without user action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no endpoint specified")]
    NoEndpoint,

    #[error("no API key configured")]
    MissingApiKey,

    #[error("no model configured")]
    MissingModel,
}

/// Where in the round trip a runtime failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No usable response arrived (connect failure, timeout, send error).
    Request,
    /// A response arrived but was an error status or could not be used.
    Response,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Request => f.write_str("request"),
            Phase::Response => f.write_str("response"),
        }
    }
}

/// Any failure during or after the provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{protocol} {phase} failed: {cause}")]
pub struct EnhancementError {
    pub phase: Phase,
    pub protocol: Protocol,
    pub cause: String,
}

impl EnhancementError {
    pub fn request(protocol: Protocol, cause: impl Into<String>) -> Self {
        Self {
            phase: Phase::Request,
            protocol,
            cause: cause.into(),
        }
    }

    pub fn response(protocol: Protocol, cause: impl Into<String>) -> Self {
        Self {
            phase: Phase::Response,
            protocol,
            cause: cause.into(),
        }
    }
}

/// A protocol name that does not map to any known wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported protocol: {0}")]
pub struct UnsupportedProtocolError(pub String);

/// Umbrella error returned by the enhancement core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Enhancement(#[from] EnhancementError),

    #[error(transparent)]
    UnsupportedProtocol(#[from] UnsupportedProtocolError),
}

impl Error {
    /// True for failures the user must fix by re-running setup.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::UnsupportedProtocol(_))
    }
}
