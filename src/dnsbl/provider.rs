//! DNSBL providers and the per-provider listing check.

use super::resolver::ZoneResolver;
use super::zone::{build_zone, normalize_suffix};
use crate::error::ResolutionFailure;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

/// A configured blocklist and the weight it adds to the score when it lists
/// an address.
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    /// Zone suffix, normalized (lower-case, no trailing dot).
    pub suffix: String,
    pub weight: f64,
}

impl Provider {
    pub fn new(suffix: &str, weight: f64) -> Self {
        Self {
            suffix: normalize_suffix(suffix),
            weight,
        }
    }

    /// [`is_listed`] bounded by `timeout`. A lookup that does not finish in
    /// time counts as not listed.
    pub async fn check(
        &self,
        resolver: &dyn ZoneResolver,
        ip: Ipv4Addr,
        predicate: u8,
        timeout: Duration,
    ) -> bool {
        match tokio::time::timeout(timeout, is_listed(resolver, ip, &self.suffix, predicate)).await
        {
            Ok(listed) => listed,
            Err(_) => {
                debug!(
                    provider = %self.suffix,
                    failure = %ResolutionFailure::Timeout(timeout),
                    "Negative DNSBL response"
                );
                false
            }
        }
    }
}

/// Whether `suffix` lists `ip` with a code of at least `predicate`.
pub async fn is_listed(
    resolver: &dyn ZoneResolver,
    ip: Ipv4Addr,
    suffix: &str,
    predicate: u8,
) -> bool {
    let zone = build_zone(ip, suffix);
    let result = resolver.resolve(&zone).await;
    debug!(zone = %zone, ?result, predicate, "DNSBL result");
    result.meets(predicate)
}
