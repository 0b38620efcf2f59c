//! Upstream SMTP server configuration.

use super::defaults::default_smtp_port;
use crate::upstream::Upstream;
use serde::Deserialize;

/// One `[[upstream]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamConfig {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port (default: 25).
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

impl From<&UpstreamConfig> for Upstream {
    fn from(config: &UpstreamConfig) -> Self {
        Upstream::new(config.host.trim(), config.port)
    }
}
