//! Poll-based `eth_` filter engine.
//!
//! [`FiltersManager`] tails one shard chain: a background polling loop
//! discovers newly committed blocks by walking parent-hash links from the
//! chain tip, matches their receipt logs against every installed filter and
//! fans whole blocks out to block listeners. [`LogsAggregator`] turns the
//! push-style delivery queues into the drain-on-read buffers that
//! `eth_getFilterChanges` polling requires, and [`EthFilter`] exposes the
//! whole thing as the `eth_` filter RPC namespace.

#![warn(missing_docs, unreachable_pub)]

mod aggregator;
mod api;
mod error;
mod id;
mod manager;

pub use aggregator::LogsAggregator;
pub use api::EthFilter;
pub use error::FilterError;
pub use id::next_subscription_id;
pub use manager::{FiltersConfig, FiltersManager, DELIVERY_QUEUE_CAPACITY};
