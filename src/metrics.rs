//! Prometheus metrics collection for dnsbl-smtpd.
//!
//! Exposed on an optional HTTP endpoint (see [`crate::http`]). Every
//! recording helper is a no-op until [`init`] has run, so the admission code
//! can record unconditionally.
//!
//! - `smtpd_connections_accepted_total` - Connections accepted by the listener
//! - `smtpd_connections_rejected_total{reason}` - Connections dropped
//! - `smtpd_connections_admitted_total{upstream}` - Connections relayed
//! - `smtpd_dnsbl_hits_total{provider}` - Positive DNSBL responses
//! - `smtpd_evaluation_timeouts_total` - Evaluations finalized at the deadline
//! - `smtpd_evaluation_duration_seconds` - DNSBL evaluation latency
//! - `smtpd_active_relays` - Relay sessions in progress

use crate::upstream::Upstream;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

pub static CONNECTIONS_ACCEPTED: OnceLock<IntCounter> = OnceLock::new();

/// Rejected connections by reason (`score`, `invalid_address`).
pub static CONNECTIONS_REJECTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Admitted connections by chosen upstream.
pub static CONNECTIONS_ADMITTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Positive DNSBL responses by provider suffix.
pub static DNSBL_HITS: OnceLock<IntCounterVec> = OnceLock::new();

pub static EVALUATION_TIMEOUTS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges + Histograms
// ========================================================================

pub static ACTIVE_RELAYS: OnceLock<IntGauge> = OnceLock::new();

pub static EVALUATION_DURATION: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(CONNECTIONS_ACCEPTED, IntCounter::new("smtpd_connections_accepted_total", "Connections accepted by the listener"));
    register!(CONNECTIONS_REJECTED, IntCounterVec::new(Opts::new("smtpd_connections_rejected_total", "Connections closed without relaying"), &["reason"]));
    register!(CONNECTIONS_ADMITTED, IntCounterVec::new(Opts::new("smtpd_connections_admitted_total", "Connections relayed upstream"), &["upstream"]));
    register!(DNSBL_HITS, IntCounterVec::new(Opts::new("smtpd_dnsbl_hits_total", "Positive DNSBL responses"), &["provider"]));
    register!(EVALUATION_TIMEOUTS, IntCounter::new("smtpd_evaluation_timeouts_total", "Evaluations finalized with partial results"));
    register!(ACTIVE_RELAYS, IntGauge::new("smtpd_active_relays", "Relay sessions in progress"));
    register!(EVALUATION_DURATION, Histogram::with_opts(
        HistogramOpts::new("smtpd_evaluation_duration_seconds", "DNSBL evaluation latency")
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for admission metric updates
// ============================================================================

#[inline]
pub fn record_connection_accepted() {
    if let Some(c) = CONNECTIONS_ACCEPTED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_rejected(reason: &str) {
    if let Some(c) = CONNECTIONS_REJECTED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

/// Count an admitted connection; it stays in the active gauge until
/// [`record_relay_finished`].
#[inline]
pub fn record_admitted(upstream: &Upstream) {
    if let Some(c) = CONNECTIONS_ADMITTED.get() {
        c.with_label_values(&[&upstream.to_string()]).inc();
    }
    if let Some(g) = ACTIVE_RELAYS.get() {
        g.inc();
    }
}

#[inline]
pub fn record_relay_finished() {
    if let Some(g) = ACTIVE_RELAYS.get() {
        g.dec();
    }
}

#[inline]
pub fn record_dnsbl_hit(provider: &str) {
    if let Some(c) = DNSBL_HITS.get() {
        c.with_label_values(&[provider]).inc();
    }
}

#[inline]
pub fn record_evaluation(elapsed: Duration, timed_out: bool) {
    if let Some(h) = EVALUATION_DURATION.get() {
        h.observe(elapsed.as_secs_f64());
    }
    if timed_out && let Some(c) = EVALUATION_TIMEOUTS.get() {
        c.inc();
    }
}
