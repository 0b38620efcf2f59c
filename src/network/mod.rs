//! Network module.
//!
//! Contains the Gateway (TCP listener), the admission gate that screens each
//! accepted connection, and the relay that carries admitted sessions.

mod admission;
mod gateway;
mod relay;

#[allow(unused_imports)]
pub use admission::{AdmissionGate, AttemptState, ConnectionAttempt, Decision};
pub use gateway::Gateway;
#[allow(unused_imports)]
pub use relay::{Relay, RelayStats, TcpRelay};
