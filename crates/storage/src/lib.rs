//! Read-only access to the committed block store.
//!
//! Consumers obtain a point-in-time [`StoreReader`] snapshot per call via
//! the [`Store`] factory trait. The durable store itself lives outside this
//! workspace; [`MemStore`] is the in-memory reference implementation used by
//! tests and dev tooling.

#![warn(missing_docs, unreachable_pub)]

mod error;
mod mem;
mod store;

pub use error::StoreError;
pub use mem::{MemStore, MemStoreReader};
pub use store::{Store, StoreReader};
