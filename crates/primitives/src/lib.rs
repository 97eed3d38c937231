//! Commonly used data types for the filament node.
//!
//! The chain is a single sequence of blocks linked by parent-hash pointers,
//! one sequence per shard. Each block commits to its receipts via
//! `receipts_root`; receipts carry the contract logs that the RPC filter
//! layer matches against.

#![warn(missing_docs, unreachable_pub)]

mod block;
mod receipt;
mod shard;

pub use block::{Block, BlockNumber};
pub use receipt::{Log, Receipt};
pub use shard::ShardId;

pub use alloy_primitives::{self, Address, Bytes, B256, U256};
