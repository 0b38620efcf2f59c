//! Gateway - TCP listener that accepts incoming SMTP connections.
//!
//! The Gateway binds the listen socket and spawns one task per accepted
//! connection, so a slow DNSBL evaluation never holds up the next accept.

use super::AdmissionGate;
use crate::telemetry::spans;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Instrument, error, instrument};

/// The Gateway accepts incoming TCP connections and hands them to the gate.
pub struct Gateway {
    listener: TcpListener,
    gate: Arc<AdmissionGate>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, gate: Arc<AdmissionGate>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, gate })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    self.gate.accepted(addr);

                    let gate = Arc::clone(&self.gate);
                    tokio::spawn(
                        async move {
                            gate.handle(stream, addr).await;
                        }
                        .instrument(spans::connection(addr)),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
