//! Integration test common infrastructure.
//!
//! Provides utilities for spawning the relay binary against a generated
//! config and standing up fake upstream SMTP servers.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod server;
pub mod upstream;

#[allow(unused_imports)]
pub use server::{TestServer, dry_run, free_port};
#[allow(unused_imports)]
pub use upstream::FakeUpstream;
