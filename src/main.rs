//! dnsbl-smtpd - DNSBL-gated SMTP relay.
//!
//! Scores every inbound connection against a set of weighted DNS blocklists
//! and either drops it or relays it to the next upstream SMTP server.

mod config;
mod dnsbl;
mod error;
mod http;
mod metrics;
mod network;
mod telemetry;
mod upstream;

use crate::config::{Config, validate};
use crate::dnsbl::{HickoryResolver, ScoreAggregator, parse_ipv4};
use crate::network::{AdmissionGate, Gateway, TcpRelay};
use crate::telemetry::{AdmissionObserver, TracingObserver};
use crate::upstream::UpstreamSelector;
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status of a dry run whose verdict is "reject".
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "dnsbl-smtpd")]
#[command(version)]
#[command(about = "DNSBL checking SMTP relay")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    /// Score a single IPv4 address and exit (0 = admit, 2 = reject)
    #[arg(short = 't', long, value_name = "IPV4")]
    test: Option<String>,

    /// Log level or filter directive (overrides server.log_level)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// `RUST_LOG` wins, then `--log-level`, then the config file. Dry runs
    /// default to debug so every provider answer is visible.
    fn log_filter(&self, configured: Option<&str>) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        let fallback = if self.test.is_some() {
            "info,dnsbl_smtpd=debug"
        } else {
            "info"
        };
        let directive = self.log_level.as_deref().or(configured).unwrap_or(fallback);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(fallback))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first so its log level can seed the filter.
    let loaded = Config::load(&cli.config);
    let configured_level = loaded
        .as_ref()
        .ok()
        .and_then(|c| c.server.log_level.as_deref());

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter(configured_level))
        .with_target(true)
        .init();

    let config = loaded.map_err(|e| {
        error!(path = %cli.config, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!(
            "refusing to start: {} configuration error(s) in {}",
            errors.len(),
            cli.config
        );
    }

    let upstreams = UpstreamSelector::new(config.upstreams())
        .context("cannot route admitted connections")?;
    let providers = config.dnsbl.providers();
    if providers.is_empty() {
        warn!("No DNSBL providers configured; every connection scores 0");
    }

    let observer: Arc<dyn AdmissionObserver> = Arc::new(TracingObserver);
    let resolver = Arc::new(HickoryResolver::new(config.dnsbl.lookup_timeout()));
    let aggregator = ScoreAggregator::new(
        providers,
        config.dnsbl.policy(),
        resolver,
        Arc::clone(&observer),
    );

    info!(
        providers = aggregator.providers().len(),
        upstreams = upstreams.upstreams().len(),
        predicate = aggregator.policy().predicate,
        threshold = aggregator.policy().threshold,
        "Starting dnsbl-smtpd"
    );

    if let Some(address) = cli.test.as_deref() {
        return dry_run(&aggregator, address).await;
    }

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 (or unset) disables the HTTP endpoint.
    match config.server.metrics_port {
        Some(port) if port != 0 => {
            metrics::init();
            let listener = http::bind(port)
                .await
                .with_context(|| format!("failed to bind metrics port {port}"))?;
            tokio::spawn(http::serve(listener));
        }
        _ => info!("Metrics disabled"),
    }

    let gate = AdmissionGate::new(
        aggregator,
        upstreams,
        Arc::new(TcpRelay::new(config.relay.connect_timeout())),
        observer,
    );
    let gateway = Gateway::bind(config.listen.address, Arc::new(gate))
        .await
        .with_context(|| format!("failed to bind {}", config.listen.address))?;
    info!(address = %gateway.local_addr()?, "SMTP listener bound");

    tokio::select! {
        result = gateway.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            warn!("Interrupted, shutting down");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Score one address without opening the listener.
async fn dry_run(aggregator: &ScoreAggregator, address: &str) -> anyhow::Result<ExitCode> {
    let ip = parse_ipv4(address)?;
    let verdict = aggregator.evaluate(ip).await;

    let label = if verdict.reject { "SPAM" } else { "NOT SPAM" };
    println!(
        "{ip}: score {} (threshold {}) - {label}",
        verdict.score, verdict.threshold
    );
    for provider in &verdict.triggered {
        println!("  listed by {provider}");
    }
    if verdict.timed_out {
        println!("  (some providers did not answer before the deadline)");
    }

    Ok(if verdict.reject {
        ExitCode::from(EXIT_REJECTED)
    } else {
        ExitCode::SUCCESS
    })
}
