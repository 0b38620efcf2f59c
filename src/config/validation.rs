//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::dnsbl::zone::normalize_suffix;
use std::collections::HashSet;
use std::net::IpAddr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("at least one [[upstream]] is required (NoUpstreamsConfigured)")]
    NoUpstreamsConfigured,
    #[error("upstream #{0} has an empty host")]
    EmptyUpstreamHost(usize),
    #[error("upstream {0} has port 0")]
    InvalidUpstreamPort(String),
    #[error("dnsbl provider suffix is empty")]
    EmptyProviderSuffix,
    #[error("dnsbl provider suffix is not a domain name: '{0}'")]
    InvalidProviderSuffix(String),
    #[error("dnsbl provider '{0}' is configured more than once")]
    DuplicateProvider(String),
    #[error("dnsbl provider '{0}' has an invalid weight {1} (must be finite and >= 0)")]
    InvalidWeight(String, f64),
    #[error("dnsbl.threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
    #[error("dnsbl.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("dnsbl.lookup_timeout_ms ({lookup}) exceeds dnsbl.evaluation_timeout_ms ({evaluation})")]
    LookupTimeoutExceedsDeadline { lookup: u64, evaluation: u64 },
    #[error("relay.connect_timeout_ms must be greater than zero")]
    ZeroConnectTimeout,
    #[error("server.log_level is not a valid filter: '{0}'")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Upstreams
    if config.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreamsConfigured);
    }
    for (index, upstream) in config.upstreams.iter().enumerate() {
        if upstream.host.trim().is_empty() {
            errors.push(ValidationError::EmptyUpstreamHost(index));
        } else if upstream.port == 0 {
            errors.push(ValidationError::InvalidUpstreamPort(upstream.host.clone()));
        }
    }

    // Providers
    let mut seen = HashSet::new();
    for (suffix, provider) in &config.dnsbl.providers {
        let normalized = normalize_suffix(suffix);
        if normalized.is_empty() {
            errors.push(ValidationError::EmptyProviderSuffix);
            continue;
        }
        if !is_domain_suffix(&normalized) {
            errors.push(ValidationError::InvalidProviderSuffix(suffix.clone()));
        }
        if !seen.insert(normalized.clone()) {
            errors.push(ValidationError::DuplicateProvider(normalized));
        }
        if !provider.weight.is_finite() || provider.weight < 0.0 {
            errors.push(ValidationError::InvalidWeight(suffix.clone(), provider.weight));
        }
    }

    // Scoring
    let dnsbl = &config.dnsbl;
    if !dnsbl.threshold.is_finite() {
        errors.push(ValidationError::InvalidThreshold(dnsbl.threshold));
    }
    if dnsbl.lookup_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("lookup_timeout_ms"));
    }
    if dnsbl.evaluation_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("evaluation_timeout_ms"));
    }
    if dnsbl.lookup_timeout_ms > dnsbl.evaluation_timeout_ms && dnsbl.evaluation_timeout_ms > 0 {
        errors.push(ValidationError::LookupTimeoutExceedsDeadline {
            lookup: dnsbl.lookup_timeout_ms,
            evaluation: dnsbl.evaluation_timeout_ms,
        });
    }

    if config.relay.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if let Some(level) = &config.server.log_level
        && EnvFilter::try_new(level).is_err()
    {
        errors.push(ValidationError::InvalidLogLevel(level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Dotted labels of letters, digits and hyphens; not an IP literal.
fn is_domain_suffix(suffix: &str) -> bool {
    if suffix.parse::<IpAddr>().is_ok() {
        return false;
    }
    suffix.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}
