//! Wire-facing types for the poll-based `eth_` filter API.

#![warn(missing_docs, unreachable_pub)]

mod filter;
mod log;

pub use filter::{FilterChanges, FilterId, FilterQuery, QueryError};
pub use log::MetaLog;
