use crate::{Store, StoreError, StoreReader};
use filament_primitives::{
    alloy_primitives::keccak256, Block, BlockNumber, Receipt, ShardId, B256,
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// In-memory block store.
///
/// Writes swap in a fresh [`Arc`]'d state, so a [`MemStoreReader`] is a true
/// point-in-time snapshot: appends performed after [`Store::reader`] are not
/// visible through it.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    inner: Arc<RwLock<Arc<ChainState>>>,
}

#[derive(Debug, Default, Clone)]
struct ChainState {
    shards: HashMap<ShardId, ShardChain>,
    receipts: HashMap<B256, Vec<Receipt>>,
}

#[derive(Debug, Default, Clone)]
struct ShardChain {
    tip: Option<(BlockNumber, B256)>,
    blocks_by_hash: HashMap<B256, Block>,
    hash_by_number: HashMap<BlockNumber, B256>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a new block carrying the given receipts at the shard's tip and
    /// returns it.
    ///
    /// The first appended block is the shard's genesis block.
    pub fn append_block(&self, shard: ShardId, receipts: Vec<Receipt>) -> Block {
        let mut guard = self.inner.write();
        let mut state = (**guard).clone();
        let chain = state.shards.entry(shard).or_default();

        let (number, parent_hash) = match chain.tip {
            Some((tip_number, tip_hash)) => (tip_number + 1, tip_hash),
            None => (0, B256::ZERO),
        };
        let receipts_root = receipts_root(shard, number, parent_hash);
        let block = Block { number, parent_hash, receipts_root };
        let hash = block.hash(shard);

        chain.blocks_by_hash.insert(hash, block.clone());
        chain.hash_by_number.insert(number, hash);
        chain.tip = Some((number, hash));
        state.receipts.insert(receipts_root, receipts);

        *guard = Arc::new(state);
        block
    }
}

/// Synthetic per-block lookup key for the receipt list. Derived from the
/// block position only, not from the receipts themselves.
fn receipts_root(shard: ShardId, number: BlockNumber, parent_hash: B256) -> B256 {
    let mut buf = [0u8; 9 + 4 + 8 + 32];
    buf[..9].copy_from_slice(b"receipts:");
    buf[9..13].copy_from_slice(&shard.as_u32().to_le_bytes());
    buf[13..21].copy_from_slice(&number.to_le_bytes());
    buf[21..].copy_from_slice(parent_hash.as_slice());
    keccak256(buf)
}

impl Store for MemStore {
    type Reader = MemStoreReader;

    fn reader(&self) -> Result<Self::Reader, StoreError> {
        Ok(MemStoreReader { state: Arc::clone(&self.inner.read()) })
    }
}

/// Snapshot of a [`MemStore`] taken at [`Store::reader`] time.
#[derive(Debug, Clone)]
pub struct MemStoreReader {
    state: Arc<ChainState>,
}

impl MemStoreReader {
    fn shard(&self, shard: ShardId) -> Result<&ShardChain, StoreError> {
        self.state.shards.get(&shard).ok_or(StoreError::KeyNotFound)
    }
}

impl StoreReader for MemStoreReader {
    fn tip_hash(&self, shard: ShardId) -> Result<B256, StoreError> {
        self.shard(shard)?.tip.map(|(_, hash)| hash).ok_or(StoreError::KeyNotFound)
    }

    fn latest_block(&self, shard: ShardId) -> Result<Block, StoreError> {
        let hash = self.tip_hash(shard)?;
        self.block_by_hash(shard, hash)
    }

    fn block_by_hash(&self, shard: ShardId, hash: B256) -> Result<Block, StoreError> {
        self.shard(shard)?.blocks_by_hash.get(&hash).cloned().ok_or(StoreError::KeyNotFound)
    }

    fn block_by_number(&self, shard: ShardId, number: BlockNumber) -> Result<Block, StoreError> {
        let chain = self.shard(shard)?;
        let hash = chain.hash_by_number.get(&number).ok_or(StoreError::KeyNotFound)?;
        chain.blocks_by_hash.get(hash).cloned().ok_or(StoreError::KeyNotFound)
    }

    fn receipts_by_root(&self, root: B256) -> Result<Vec<Receipt>, StoreError> {
        self.state.receipts.get(&root).cloned().ok_or(StoreError::KeyNotFound)
    }
}
