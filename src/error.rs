//! Error types for the admission pipeline.
//!
//! Per-connection errors never leave the admission gate; they are resolved
//! into a reject or an admit there. Only [`GateError::NoUpstreamsConfigured`]
//! is fatal, and only at startup.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Gate Errors (connection admission + startup)
// ============================================================================

/// Errors raised while admitting a connection or building the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Peer (or dry-run input) is not an IPv4 address.
    #[error("invalid address: {0} is not an IPv4 address")]
    InvalidAddress(String),

    #[error("no upstream servers configured")]
    NoUpstreamsConfigured,
}

impl GateError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::NoUpstreamsConfigured => "no_upstreams_configured",
        }
    }
}

// ============================================================================
// Resolution Failures (single DNSBL lookup)
// ============================================================================

/// Why a DNSBL lookup produced no listing.
///
/// All of these are treated as "not listed". They are only ever traced at
/// debug level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("NXDOMAIN")]
    NxDomain,

    #[error("no IPv4 address in answer")]
    NoAnswer,

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("resolver error: {0}")]
    Transport(String),
}
