use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single shard chain.
///
/// Every block, receipt and filter subscription belongs to exactly one shard.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ShardId(u32);

impl ShardId {
    /// The main (coordinator) shard.
    pub const MAIN: Self = Self(0);

    /// Creates a new shard id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw shard number.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ShardId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard-{}", self.0)
    }
}
