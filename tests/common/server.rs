//! Test server management.
//!
//! Spawns and manages dnsbl-smtpd instances for integration testing.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc;
use std::time::Duration;
use tempfile::TempDir;

/// Log line printed once the SMTP listener is accepting.
const READY_MARKER: &str = "SMTP listener bound";

fn binary() -> &'static str {
    env!("CARGO_BIN_EXE_dnsbl-smtpd")
}

/// Reserve a loopback port by binding and immediately releasing it.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("no free port")
}

fn write_config(dir: &Path, body: &str) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join("config.toml");
    std::fs::write(&path, body)?;
    Ok(path)
}

/// A running relay instance.
pub struct TestServer {
    child: Child,
    port: u16,
    _dir: TempDir,
}

impl TestServer {
    /// Spawn the relay with `dnsbl` and `upstream` config sections appended
    /// to a loopback `[listen]` section.
    pub async fn spawn(extra: &str) -> anyhow::Result<Self> {
        let port = free_port();
        let dir = tempfile::tempdir()?;
        let config = write_config(
            dir.path(),
            &format!(
                r#"
[server]
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"

{extra}
"#
            ),
        )?;

        let mut child = Command::new(binary())
            .arg("--config")
            .arg(&config)
            .env("RUST_LOG", "info")
            .env("NO_COLOR", "1")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Drain stdout on a thread so the child never blocks on a full pipe.
        let stdout = child.stdout.take().expect("stdout is piped");
        let (ready_tx, ready_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut ready_tx = Some(ready_tx);
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if line.contains(READY_MARKER)
                    && let Some(tx) = ready_tx.take()
                {
                    let _ = tx.send(());
                }
            }
        });

        let server = Self {
            child,
            port,
            _dir: dir,
        };

        let ready = tokio::task::spawn_blocking(move || {
            ready_rx.recv_timeout(Duration::from_secs(10)).is_ok()
        })
        .await?;
        if !ready {
            anyhow::bail!("Server failed to start within 10 seconds");
        }

        Ok(server)
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Run the binary to completion against `config`, with extra arguments.
pub fn dry_run(config: &str, args: &[&str]) -> anyhow::Result<Output> {
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), config)?;
    let output = Command::new(binary())
        .arg("--config")
        .arg(&path)
        .args(args)
        .env("RUST_LOG", "error")
        .env("NO_COLOR", "1")
        .output()?;
    Ok(output)
}
