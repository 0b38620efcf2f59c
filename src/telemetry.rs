//! Observability for the admission pipeline.
//!
//! The gate and the aggregator report through an [`AdmissionObserver`]
//! handed to them at construction. [`TracingObserver`] turns those events
//! into `tracing` records and Prometheus updates; tests plug in their own.

use crate::dnsbl::Provider;
use crate::network::{Decision, RelayStats};
use crate::upstream::Upstream;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tracing::{debug, info, warn};

/// Receives the structured events of each connection attempt.
pub trait AdmissionObserver: Send + Sync {
    /// A connection was accepted by the listener.
    fn connection_accepted(&self, peer: SocketAddr);

    /// `provider` listed `ip`; `score` is the running total including it.
    fn provider_triggered(&self, ip: Ipv4Addr, provider: &Provider, score: f64);

    /// The final admit/reject decision for a connection.
    fn verdict(&self, peer: SocketAddr, decision: &Decision);

    /// An admitted session ended, or its upstream could not be reached.
    fn relay_finished(&self, peer: SocketAddr, upstream: &Upstream, outcome: &io::Result<RelayStats>);
}

/// Default observer: structured logs plus metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AdmissionObserver for TracingObserver {
    fn connection_accepted(&self, peer: SocketAddr) {
        info!(ip = %peer.ip(), port = peer.port(), "Incoming connection");
        crate::metrics::record_connection_accepted();
    }

    fn provider_triggered(&self, ip: Ipv4Addr, provider: &Provider, score: f64) {
        info!(
            %ip,
            provider = %provider.suffix,
            weight = provider.weight,
            score,
            "Positive DNSBL response"
        );
        crate::metrics::record_dnsbl_hit(&provider.suffix);
    }

    fn verdict(&self, peer: SocketAddr, decision: &Decision) {
        match decision {
            Decision::InvalidAddress(e) => {
                warn!(%peer, error = %e, "Connection rejected without evaluation");
            }
            Decision::Rejected(verdict) => {
                info!(
                    %peer,
                    score = verdict.score,
                    threshold = verdict.threshold,
                    triggered = ?verdict.triggered,
                    "Score above threshold, closing connection"
                );
            }
            Decision::Admitted { verdict, upstream } => {
                info!(
                    %peer,
                    score = verdict.score,
                    threshold = verdict.threshold,
                    %upstream,
                    "Score within threshold, relaying"
                );
            }
        }

        if let Some(verdict) = decision.verdict() {
            if verdict.timed_out {
                debug!(%peer, elapsed = ?verdict.elapsed, "Verdict built from partial results");
            }
            crate::metrics::record_evaluation(verdict.elapsed, verdict.timed_out);
        }
        match decision.upstream() {
            Some(upstream) => crate::metrics::record_admitted(upstream),
            None => crate::metrics::record_rejected(decision.reason_code()),
        }
    }

    fn relay_finished(&self, peer: SocketAddr, upstream: &Upstream, outcome: &io::Result<RelayStats>) {
        match outcome {
            Ok(stats) => info!(
                %peer,
                %upstream,
                to_upstream = stats.client_to_upstream,
                to_client = stats.upstream_to_client,
                "Relay session closed"
            ),
            Err(e) => warn!(%peer, %upstream, error = %e, "Relay session failed"),
        }
        crate::metrics::record_relay_finished();
    }
}

/// Standardized span constructors.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Span, info_span};

    /// Span covering one accepted connection, from evaluation to close.
    pub fn connection(peer: SocketAddr) -> Span {
        info_span!("connection", peer = %peer)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Event {
        Accepted(SocketAddr),
        Triggered { provider: String, score: f64 },
        Verdict(Decision),
        RelayFinished { upstream: Upstream, ok: bool },
    }

    /// Observer that records every event for later assertions.
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingObserver {
        pub(crate) fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }

        pub(crate) fn triggered(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Triggered { provider, .. } => Some(provider),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn decisions(&self) -> Vec<Decision> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Verdict(decision) => Some(decision),
                    _ => None,
                })
                .collect()
        }
    }

    impl AdmissionObserver for RecordingObserver {
        fn connection_accepted(&self, peer: SocketAddr) {
            self.events.lock().push(Event::Accepted(peer));
        }

        fn provider_triggered(&self, _ip: Ipv4Addr, provider: &Provider, score: f64) {
            self.events.lock().push(Event::Triggered {
                provider: provider.suffix.clone(),
                score,
            });
        }

        fn verdict(&self, _peer: SocketAddr, decision: &Decision) {
            self.events.lock().push(Event::Verdict(decision.clone()));
        }

        fn relay_finished(
            &self,
            _peer: SocketAddr,
            upstream: &Upstream,
            outcome: &io::Result<RelayStats>,
        ) {
            self.events.lock().push(Event::RelayFinished {
                upstream: upstream.clone(),
                ok: outcome.is_ok(),
            });
        }
    }

    #[test]
    fn test_running_score_is_reported() {
        let observer = RecordingObserver::default();
        let ip = Ipv4Addr::new(192, 0, 2, 1);
        observer.provider_triggered(ip, &Provider::new("a.example", 0.25), 0.25);
        observer.provider_triggered(ip, &Provider::new("b.example", 0.5), 0.75);

        assert_eq!(
            observer.events(),
            vec![
                Event::Triggered {
                    provider: "a.example".into(),
                    score: 0.25
                },
                Event::Triggered {
                    provider: "b.example".into(),
                    score: 0.75
                },
            ]
        );
    }

    #[test]
    fn test_tracing_observer_without_metrics_registry() {
        // Must not panic whether or not the metrics registry was initialized.
        let observer = TracingObserver;
        let peer: SocketAddr = "192.0.2.1:40000".parse().unwrap();
        observer.connection_accepted(peer);
        observer.verdict(
            peer,
            &Decision::InvalidAddress(crate::error::GateError::InvalidAddress("::1".into())),
        );
    }
}
