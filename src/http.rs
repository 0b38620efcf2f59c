//! HTTP server for the Prometheus metrics endpoint.
//!
//! The socket is bound during startup so a port clash stops the process
//! before the SMTP listener opens; serving then runs on its own task.

use axum::{Router, routing::get};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Bind the metrics listener on all interfaces.
pub async fn bind(port: u16) -> io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Prometheus HTTP server listening");
    Ok(listener)
}

/// Serve `/metrics` on `listener` until the process exits.
pub async fn serve(listener: TcpListener) {
    let app = Router::new().route("/metrics", get(metrics_handler));
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server error");
    }
}
