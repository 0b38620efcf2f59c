//! Network listener and relay configuration.

use super::defaults::{default_connect_timeout_ms, default_listen_address};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (default: "0.0.0.0:25").
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

/// Relay configuration for admitted sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Milliseconds to wait for the upstream TCP connect (default: 10000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl RelayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
