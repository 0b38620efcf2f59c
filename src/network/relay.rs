//! Transparent relay of admitted sessions to an upstream SMTP server.
//!
//! The relay does not speak SMTP. Once both sockets are connected, bytes are
//! copied in both directions until one side closes.

use crate::upstream::Upstream;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// Byte counts of a finished relay session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub client_to_upstream: u64,
    pub upstream_to_client: u64,
}

/// Carries an admitted client connection to its upstream.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Runs until the session ends. An `Err` means the session could not be
    /// established or broke mid-stream; the client is closed either way.
    async fn relay(&self, client: TcpStream, upstream: &Upstream) -> io::Result<RelayStats>;
}

/// [`Relay`] over plain TCP.
#[derive(Debug, Clone)]
pub struct TcpRelay {
    connect_timeout: Duration,
}

impl TcpRelay {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Relay for TcpRelay {
    async fn relay(&self, mut client: TcpStream, upstream: &Upstream) -> io::Result<RelayStats> {
        let connect = TcpStream::connect((upstream.host.as_str(), upstream.port));
        let mut server = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(stream) => stream?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {upstream} timed out"),
                ));
            }
        };

        let (client_to_upstream, upstream_to_client) =
            tokio::io::copy_bidirectional(&mut client, &mut server).await?;

        Ok(RelayStats {
            client_to_upstream,
            upstream_to_client,
        })
    }
}
