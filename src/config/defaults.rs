//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// Listener Defaults
// =============================================================================

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 25))
}

pub fn default_connect_timeout_ms() -> u64 {
    10_000
}

// =============================================================================
// DNSBL Defaults
// =============================================================================

/// Lowest listing code that counts (127.0.0.2 is the conventional "listed"
/// answer; 127.0.0.1 is reserved).
pub fn default_predicate() -> u8 {
    2
}

pub fn default_threshold() -> f64 {
    1.0
}

pub fn default_lookup_timeout_ms() -> u64 {
    2_000
}

pub fn default_evaluation_timeout_ms() -> u64 {
    5_000
}

// =============================================================================
// Upstream Defaults
// =============================================================================

pub fn default_smtp_port() -> u16 {
    25
}
