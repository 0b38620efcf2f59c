//! Fake upstream SMTP server.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Greets every connection with `220 <name> ready` and then echoes bytes
/// back until the client hangs up.
pub struct FakeUpstream {
    addr: SocketAddr,
}

impl FakeUpstream {
    pub async fn spawn(name: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let banner = format!("220 {name} ready\r\n");

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let banner = banner.clone();
                tokio::spawn(async move {
                    if stream.write_all(banner.as_bytes()).await.is_err() {
                        return;
                    }
                    let mut buf = [0u8; 1024];
                    while let Ok(n) = stream.read(&mut buf).await {
                        if n == 0 || stream.write_all(&buf[..n]).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Ok(Self { addr })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// An `[[upstream]]` config entry pointing at this server.
    pub fn config_entry(&self) -> String {
        format!(
            "[[upstream]]\nhost = \"127.0.0.1\"\nport = {}\n",
            self.port()
        )
    }
}
