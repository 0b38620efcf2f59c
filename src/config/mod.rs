//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level config struct and loading (Config, ServerConfig)
//! - [`listen`]: Listener and relay settings (ListenConfig, RelayConfig)
//! - [`dnsbl`]: Provider set and scoring settings (DnsblConfig, ProviderConfig)
//! - [`upstream`]: Upstream SMTP servers (UpstreamConfig)
//! - [`validation`]: Startup checks over the whole config

mod defaults;
mod dnsbl;
mod listen;
mod types;
mod upstream;
mod validation;

// Re-export all public types for convenient access
// Some may be unused currently but are part of the public API
#[allow(unused_imports)]
pub use dnsbl::{DnsblConfig, ProviderConfig};
#[allow(unused_imports)]
pub use listen::{ListenConfig, RelayConfig};
#[allow(unused_imports)]
pub use types::{Config, ConfigError, ServerConfig};
#[allow(unused_imports)]
pub use upstream::UpstreamConfig;
#[allow(unused_imports)]
pub use validation::{ValidationError, validate};
