use crate::ShardId;
use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};

/// A block number.
pub type BlockNumber = u64;

/// A committed block header, reduced to the fields the RPC layer consumes.
///
/// Blocks form a linear chain per shard: `parent_hash` points at the
/// previously committed block, the genesis block points at the zero hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Height of this block, starting at 0 for genesis.
    pub number: BlockNumber,
    /// Hash of the previous block on the same shard, zero for genesis.
    pub parent_hash: B256,
    /// Commitment to the receipts produced by this block.
    pub receipts_root: B256,
}

impl Block {
    /// Computes the block hash, scoped to the given shard.
    pub fn hash(&self, shard: ShardId) -> B256 {
        let mut buf = [0u8; 4 + 8 + 32 + 32];
        buf[..4].copy_from_slice(&shard.as_u32().to_le_bytes());
        buf[4..12].copy_from_slice(&self.number.to_le_bytes());
        buf[12..44].copy_from_slice(self.parent_hash.as_slice());
        buf[44..].copy_from_slice(self.receipts_root.as_slice());
        keccak256(buf)
    }

    /// Returns true if this is the genesis block of its shard.
    pub fn is_genesis(&self) -> bool {
        self.parent_hash.is_zero()
    }
}
