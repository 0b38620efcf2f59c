//! DNSBL admission scoring.
//!
//! ```text
//! peer ip ─► zone (per provider) ─► resolver ─► listed? ─► Σ weights ─► verdict
//! ```
//!
//! - [`zone`]: query name construction and address validation
//! - [`resolver`]: DNS lookups and listing-code extraction
//! - [`provider`]: per-provider listing check
//! - [`score`]: concurrent evaluation and threshold comparison

pub mod provider;
pub mod resolver;
pub mod score;
pub mod zone;

pub use provider::Provider;
pub use resolver::HickoryResolver;
#[allow(unused_imports)] // resolver seam, implemented by the test stubs
pub use resolver::{ListingResult, ZoneResolver};
pub use score::{ScoreAggregator, ScoringPolicy, Verdict};
pub use zone::{parse_ipv4, peer_ipv4};
