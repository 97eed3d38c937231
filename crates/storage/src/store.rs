use crate::StoreError;
use filament_primitives::{Block, BlockNumber, Receipt, ShardId, B256};

/// Factory handing out read-only snapshots of the block store.
///
/// Every call site that needs consistent reads obtains a fresh
/// [`StoreReader`]; the reader observes the store as of the moment it was
/// created and is unaffected by concurrent commits.
pub trait Store: Send + Sync + 'static {
    /// The snapshot type produced by this store.
    type Reader: StoreReader + Send;

    /// Opens a point-in-time read-only snapshot.
    fn reader(&self) -> Result<Self::Reader, StoreError>;
}

/// Read operations against one point-in-time snapshot of the store.
pub trait StoreReader {
    /// Returns the hash of the most recently committed block on the shard.
    ///
    /// Fails with [`StoreError::KeyNotFound`] if the shard has no committed
    /// blocks yet.
    fn tip_hash(&self, shard: ShardId) -> Result<B256, StoreError>;

    /// Returns the most recently committed block on the shard.
    fn latest_block(&self, shard: ShardId) -> Result<Block, StoreError>;

    /// Reads a block by its hash.
    fn block_by_hash(&self, shard: ShardId, hash: B256) -> Result<Block, StoreError>;

    /// Reads a block by its height.
    fn block_by_number(&self, shard: ShardId, number: BlockNumber) -> Result<Block, StoreError>;

    /// Reads the receipts committed under the given receipts root.
    fn receipts_by_root(&self, root: B256) -> Result<Vec<Receipt>, StoreError>;
}
