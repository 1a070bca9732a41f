//! Relay snapshot processing.
//!
//! A snapshot of the Onionoo details document is normalized, ranked by
//! observed bandwidth and indexed by AS, contact, country, family, flag,
//! platform and first-seen date. The resulting [`RelaySet`] is immutable and
//! is what the site renderer reads from.

pub mod config;
pub mod index;
pub mod key;
pub mod metrics_defs;
pub mod normalize;
pub mod onionoo;
pub mod query;
pub mod rank;
pub mod relay_set;
pub mod timestamp;
pub mod types;

#[cfg(test)]
mod testutils;

#[doc(hidden)]
pub use metrics;

pub use index::{AggregationStats, Bucket, BucketExtra, Category, FamilyInfo, Index, NetworkInfo};
pub use key::{BucketKey, is_valid_key};
pub use query::QueryError;
pub use relay_set::RelaySet;
pub use types::{Details, RawRelay, Relay};
