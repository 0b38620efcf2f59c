//! DNSBL provider and scoring configuration.

use super::defaults::{
    default_evaluation_timeout_ms, default_lookup_timeout_ms, default_predicate,
    default_threshold,
};
use crate::dnsbl::{Provider, ScoringPolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// The `[dnsbl]` section.
///
/// ```toml
/// [dnsbl]
/// predicate = 2
/// threshold = 1.0
///
/// [dnsbl.providers."zen.spamhaus.org"]
/// weight = 0.8
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DnsblConfig {
    /// Minimum last-octet code for a reply to count as listed (default: 2).
    #[serde(default = "default_predicate")]
    pub predicate: u8,
    /// Connections scoring strictly above this are dropped (default: 1.0).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Per-provider lookup timeout in milliseconds (default: 2000).
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Deadline for a whole evaluation in milliseconds (default: 5000).
    #[serde(default = "default_evaluation_timeout_ms")]
    pub evaluation_timeout_ms: u64,
    /// Providers keyed by zone suffix.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Settings for one provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderConfig {
    /// Score added when this provider lists the address (default: 0.0).
    #[serde(default)]
    pub weight: f64,
}

impl Default for DnsblConfig {
    fn default() -> Self {
        Self {
            predicate: default_predicate(),
            threshold: default_threshold(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            evaluation_timeout_ms: default_evaluation_timeout_ms(),
            providers: HashMap::new(),
        }
    }
}

impl DnsblConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluation_timeout_ms)
    }

    pub fn policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            predicate: self.predicate,
            threshold: self.threshold,
            lookup_timeout: self.lookup_timeout(),
            evaluation_timeout: self.evaluation_timeout(),
        }
    }

    /// Providers with normalized suffixes, sorted by suffix.
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self
            .providers
            .iter()
            .map(|(suffix, settings)| Provider::new(suffix, settings.weight))
            .collect();
        providers.sort_by(|a, b| a.suffix.cmp(&b.suffix));
        providers
    }
}
