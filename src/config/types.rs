//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::dnsbl::DnsblConfig;
use super::listen::{ListenConfig, RelayConfig};
use super::upstream::UpstreamConfig;
use crate::upstream::Upstream;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Relay configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Process-level settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Upstream connection settings.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Blocklists and scoring.
    #[serde(default)]
    pub dnsbl: DnsblConfig,
    /// Upstream SMTP servers, used in order, round-robin.
    #[serde(default, rename = "upstream")]
    pub upstreams: Vec<UpstreamConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn upstreams(&self) -> Vec<Upstream> {
        self.upstreams.iter().map(Upstream::from).collect()
    }
}

/// Process-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Log level or filter directive (e.g. "info", "debug"). `RUST_LOG` and
    /// `--log-level` take precedence.
    pub log_level: Option<String>,
    /// Prometheus metrics HTTP port. Unset or 0 disables the endpoint.
    pub metrics_port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_full_config_parses() {
        let config: Config = toml::from_str(
            r#"
[server]
log_level = "debug"
metrics_port = 9191

[listen]
address = "127.0.0.1:2525"

[relay]
connect_timeout_ms = 3000

[dnsbl]
predicate = 3
threshold = 0.9

[dnsbl.providers."zen.spamhaus.org"]
weight = 1.0

[[upstream]]
host = "mx1.internal"
port = 2525

[[upstream]]
host = "mx2.internal"
"#,
        )
        .unwrap();

        assert_eq!(config.server.log_level.as_deref(), Some("debug"));
        assert_eq!(config.server.metrics_port, Some(9191));
        assert_eq!(config.listen.address, "127.0.0.1:2525".parse().unwrap());
        assert_eq!(config.relay.connect_timeout_ms, 3000);
        assert_eq!(config.dnsbl.predicate, 3);
        assert_eq!(
            config.upstreams(),
            vec![
                Upstream::new("mx1.internal", 2525),
                Upstream::new("mx2.internal", 25),
            ]
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.listen.address, "0.0.0.0:25".parse().unwrap());
        assert_eq!(config.relay.connect_timeout_ms, 10_000);
        assert!(config.server.metrics_port.is_none());
        assert!(config.upstreams.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[upstream]]
host = "127.0.0.1"
port = 2525
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.upstreams(), vec![Upstream::new("127.0.0.1", 2525)]);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dnsbl]\npredicate = 300").unwrap();

        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/dnsbl-smtpd.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
