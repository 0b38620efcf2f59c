//! DNSBL resolution.
//!
//! The listing convention: an A record `127.0.0.N` for the query name means
//! "listed", with `N` (the last octet) as the listing code. No record, or
//! any failure at all, means "not listed".

use crate::error::ResolutionFailure;
use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Outcome of a single DNSBL lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingResult {
    /// The zone resolved; carries the last octet of the answer.
    Listed(u8),
    NotListed,
}

impl ListingResult {
    /// Whether this result counts as a listing under `predicate`.
    #[inline]
    pub fn meets(self, predicate: u8) -> bool {
        matches!(self, Self::Listed(code) if code >= predicate)
    }
}

/// Resolves DNSBL query names into listing results.
///
/// Implementations must never fail: every error is a `NotListed`.
#[async_trait]
pub trait ZoneResolver: Send + Sync {
    async fn resolve(&self, zone: &str) -> ListingResult;
}

/// Listing code carried by a DNSBL answer: the last octet of the first IPv4
/// address.
pub fn listing_code<I>(answers: I) -> Option<u8>
where
    I: IntoIterator<Item = IpAddr>,
{
    answers.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(v4.octets()[3]),
        IpAddr::V6(_) => None,
    })
}

/// [`ZoneResolver`] backed by hickory-resolver.
///
/// Configured for DNSBL use: IPv4 answers only, one attempt per lookup and no
/// answer cache, so every connection is evaluated against fresh data.
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: TokioResolver,
}

impl HickoryResolver {
    /// Build a resolver from the system configuration, falling back to the
    /// hickory defaults if `/etc/resolv.conf` cannot be read.
    pub fn new(lookup_timeout: Duration) -> Self {
        let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
            debug!(error = %e, "System resolver config unavailable, using defaults");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
        });

        let opts = builder.options_mut();
        opts.timeout = lookup_timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.ip_strategy = LookupIpStrategy::Ipv4Only;

        Self {
            resolver: builder.build(),
        }
    }

    async fn lookup(&self, zone: &str) -> Result<u8, ResolutionFailure> {
        match self.resolver.lookup_ip(zone).await {
            Ok(response) => listing_code(response.iter()).ok_or(ResolutionFailure::NoAnswer),
            Err(e) => {
                let message = e.to_string();
                if message.contains("NXDomain") || message.contains("no record found") {
                    Err(ResolutionFailure::NxDomain)
                } else {
                    Err(ResolutionFailure::Transport(message))
                }
            }
        }
    }
}

#[async_trait]
impl ZoneResolver for HickoryResolver {
    async fn resolve(&self, zone: &str) -> ListingResult {
        match self.lookup(zone).await {
            Ok(code) => {
                debug!(zone = %zone, code, "DNSBL reply");
                ListingResult::Listed(code)
            }
            Err(failure) => {
                debug!(zone = %zone, %failure, "Negative DNSBL response");
                ListingResult::NotListed
            }
        }
    }
}
