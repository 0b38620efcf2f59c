//! Admission gate.
//!
//! Each accepted connection moves through:
//!
//! ```text
//! ACCEPTED ──► EVALUATING ──► ADMITTED ──► CLOSED
//!     │             │                        ▲
//!     └─────────────┴──────► REJECTED ───────┘
//! ```
//!
//! Rejected connections are closed before any byte is written, so the client
//! never sees a banner. Admitted connections get exactly one upstream from
//! the selector and are handed to the relay.

use super::relay::Relay;
use crate::dnsbl::{ScoreAggregator, Verdict, peer_ipv4};
use crate::error::GateError;
use crate::telemetry::AdmissionObserver;
use crate::upstream::{Upstream, UpstreamSelector};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::trace;

/// Lifecycle of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Accepted,
    Evaluating,
    Rejected,
    Admitted,
    Closed,
}

impl AttemptState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Evaluating => "evaluating",
            Self::Rejected => "rejected",
            Self::Admitted => "admitted",
            Self::Closed => "closed",
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use AttemptState::*;
        matches!(
            (self, next),
            (Accepted, Evaluating)
                | (Accepted, Rejected)
                | (Evaluating, Rejected)
                | (Evaluating, Admitted)
                | (Rejected, Closed)
                | (Admitted, Closed)
        )
    }
}

/// State carried by a connection between accept and close.
#[derive(Debug)]
pub struct ConnectionAttempt {
    peer: SocketAddr,
    state: AttemptState,
}

impl ConnectionAttempt {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            state: AttemptState::Accepted,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    fn advance(&mut self, next: AttemptState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state.name(),
            next.name()
        );
        trace!(peer = %self.peer, from = self.state.name(), to = next.name(), "Connection state");
        self.state = next;
    }
}

/// Outcome of admission for one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The peer is not IPv4; no provider was consulted.
    InvalidAddress(GateError),
    /// The score exceeded the threshold.
    Rejected(Verdict),
    Admitted { verdict: Verdict, upstream: Upstream },
}

impl Decision {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::InvalidAddress(_) => None,
            Self::Rejected(verdict) | Self::Admitted { verdict, .. } => Some(verdict),
        }
    }

    pub fn upstream(&self) -> Option<&Upstream> {
        match self {
            Self::Admitted { upstream, .. } => Some(upstream),
            _ => None,
        }
    }

    /// Static label for metrics.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidAddress(e) => e.error_code(),
            Self::Rejected(_) => "score",
            Self::Admitted { .. } => "admitted",
        }
    }
}

/// Decides the fate of every accepted connection.
pub struct AdmissionGate {
    aggregator: ScoreAggregator,
    upstreams: UpstreamSelector,
    relay: Arc<dyn Relay>,
    observer: Arc<dyn AdmissionObserver>,
}

impl AdmissionGate {
    pub fn new(
        aggregator: ScoreAggregator,
        upstreams: UpstreamSelector,
        relay: Arc<dyn Relay>,
        observer: Arc<dyn AdmissionObserver>,
    ) -> Self {
        Self {
            aggregator,
            upstreams,
            relay,
            observer,
        }
    }

    /// Record a freshly accepted connection.
    pub fn accepted(&self, peer: SocketAddr) {
        self.observer.connection_accepted(peer);
    }

    /// Run admission for `attempt`, leaving it in `Rejected` or `Admitted`.
    ///
    /// The upstream cursor only moves for admitted connections.
    pub async fn decide(&self, attempt: &mut ConnectionAttempt) -> Decision {
        let decision = match peer_ipv4(attempt.peer().ip()) {
            Err(e) => {
                attempt.advance(AttemptState::Rejected);
                Decision::InvalidAddress(e)
            }
            Ok(ip) => {
                attempt.advance(AttemptState::Evaluating);
                let verdict = self.aggregator.evaluate(ip).await;
                if verdict.reject {
                    attempt.advance(AttemptState::Rejected);
                    Decision::Rejected(verdict)
                } else {
                    attempt.advance(AttemptState::Admitted);
                    let upstream = self.upstreams.next().clone();
                    Decision::Admitted { verdict, upstream }
                }
            }
        };

        self.observer.verdict(attempt.peer(), &decision);
        decision
    }

    /// Drive one connection from accept to close.
    pub async fn handle(&self, stream: TcpStream, peer: SocketAddr) -> AttemptState {
        let mut attempt = ConnectionAttempt::new(peer);

        match self.decide(&mut attempt).await {
            Decision::Admitted { upstream, .. } => {
                let outcome = self.relay.relay(stream, &upstream).await;
                self.observer.relay_finished(peer, &upstream, &outcome);
            }
            Decision::Rejected(_) | Decision::InvalidAddress(_) => drop(stream),
        }

        attempt.advance(AttemptState::Closed);
        attempt.state()
    }
}
