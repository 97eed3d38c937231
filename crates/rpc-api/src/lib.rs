//! RPC interface for the poll-based `eth_` filter API.

#![warn(missing_docs, unreachable_pub)]

mod eth_filter;

pub use eth_filter::EthFilterApiServer;
#[cfg(feature = "client")]
pub use eth_filter::EthFilterApiClient;
