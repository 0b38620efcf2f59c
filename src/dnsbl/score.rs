//! Weighted score aggregation across all configured providers.
//!
//! Every provider is queried concurrently. The evaluation as a whole runs
//! against a deadline; when it passes, lookups still in flight are dropped
//! and the verdict is built from the providers that already answered.

use super::provider::Provider;
use super::resolver::ZoneResolver;
use crate::telemetry::AdmissionObserver;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Static scoring settings, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// Minimum listing code for a reply to count.
    pub predicate: u8,
    /// Reject when the score is strictly greater than this.
    pub threshold: f64,
    /// Bound on each provider lookup.
    pub lookup_timeout: Duration,
    /// Bound on the whole evaluation.
    pub evaluation_timeout: Duration,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            predicate: 2,
            threshold: 1.0,
            lookup_timeout: Duration::from_secs(2),
            evaluation_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of evaluating one address.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub reject: bool,
    pub score: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// Suffixes of the providers that listed the address, sorted.
    pub triggered: Vec<String>,
    /// The evaluation deadline passed with lookups still outstanding.
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Runs every provider against an address and turns the hits into a verdict.
pub struct ScoreAggregator {
    /// Sorted by suffix, no duplicates.
    providers: Vec<Provider>,
    policy: ScoringPolicy,
    resolver: Arc<dyn ZoneResolver>,
    observer: Arc<dyn AdmissionObserver>,
}

impl ScoreAggregator {
    pub fn new(
        mut providers: Vec<Provider>,
        policy: ScoringPolicy,
        resolver: Arc<dyn ZoneResolver>,
        observer: Arc<dyn AdmissionObserver>,
    ) -> Self {
        providers.sort_by(|a, b| a.suffix.cmp(&b.suffix));
        providers.dedup_by(|a, b| a.suffix == b.suffix);
        Self {
            providers,
            policy,
            resolver,
            observer,
        }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Evaluate `ip` against every provider.
    ///
    /// Never fails and never runs past `evaluation_timeout`. The score is
    /// summed in suffix order so the result is the same whatever order the
    /// lookups complete in.
    pub async fn evaluate(&self, ip: Ipv4Addr) -> Verdict {
        let started = Instant::now();
        let ScoringPolicy {
            predicate,
            threshold,
            lookup_timeout,
            evaluation_timeout,
        } = self.policy;
        let resolver = self.resolver.as_ref();

        let mut pending: FuturesUnordered<_> = self
            .providers
            .iter()
            .map(|provider| async move {
                let listed = provider
                    .check(resolver, ip, predicate, lookup_timeout)
                    .await;
                (provider, listed)
            })
            .collect();

        let mut hits: Vec<&Provider> = Vec::new();
        let mut timed_out = false;
        let deadline = tokio::time::sleep_until(started + evaluation_timeout);
        tokio::pin!(deadline);

        while !pending.is_empty() {
            tokio::select! {
                Some((provider, listed)) = pending.next() => {
                    if listed {
                        hits.push(provider);
                    }
                }
                () = &mut deadline => {
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out {
            debug!(
                %ip,
                outstanding = pending.len(),
                "DNSBL evaluation deadline reached, using partial score"
            );
        }
        drop(pending);

        hits.sort_by(|a, b| a.suffix.cmp(&b.suffix));
        let mut score = 0.0;
        for provider in &hits {
            score += provider.weight;
            self.observer.provider_triggered(ip, provider, score);
        }

        Verdict {
            reject: score > threshold,
            score,
            threshold,
            triggered: hits.iter().map(|p| p.suffix.clone()).collect(),
            timed_out,
            elapsed: started.elapsed(),
        }
    }
}
