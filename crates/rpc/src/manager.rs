use crate::{id::next_subscription_id, FilterError};
use filament_primitives::{Block, Receipt, ShardId, B256, U256};
use filament_rpc_types::{FilterId, FilterQuery, MetaLog};
use filament_storage::{Store, StoreError, StoreReader};
use filament_tasks::{signal, Shutdown, Signal};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::warn;

/// Capacity of every filter and block-listener delivery queue.
pub const DELIVERY_QUEUE_CAPACITY: usize = 100;

/// Default interval between chain tip polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Configuration for a [`FiltersManager`].
#[derive(Debug, Clone)]
pub struct FiltersConfig {
    /// Interval between chain tip polls.
    pub poll_interval: Duration,
    /// Whether to spawn the background polling loop.
    ///
    /// Disabled by deterministic tests that drive discovery through
    /// [`FiltersManager::poll_once`] instead.
    pub poll_enabled: bool,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, poll_enabled: true }
    }
}

/// Manages log filters and block listeners over one shard chain.
///
/// A background polling loop discovers newly committed blocks by reading the
/// shard's tip hash and walking parent-hash links back to the previously
/// observed tip. Each discovered block is fanned out to every block listener
/// (non-blocking, dropped if the listener's queue is full) and matched
/// against every installed filter (blocking delivery: a full filter queue
/// stalls the whole tick until its consumer drains).
///
/// One manager instance serves exactly one shard; multi-shard nodes run one
/// manager per shard.
pub struct FiltersManager<S> {
    inner: Arc<ManagerInner<S>>,
}

impl<S> Clone for FiltersManager<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct ManagerInner<S> {
    store: S,
    shard: ShardId,
    /// Filter map, listener map and chain cursor form one aggregate: no
    /// operation mutates any of them without this lock.
    registry: Mutex<Registry>,
    poll_task: parking_lot::Mutex<Option<PollTask>>,
}

#[derive(Default)]
struct Registry {
    filters: HashMap<FilterId, ActiveFilter>,
    block_subs: HashMap<FilterId, mpsc::Sender<Block>>,
    /// Chain cursor: hash of the newest block already processed. Starts at
    /// the zero hash and only ever advances to a tip hash returned by the
    /// store.
    last_hash: B256,
}

struct ActiveFilter {
    query: FilterQuery,
    tx: mpsc::Sender<MetaLog>,
}

struct PollTask {
    signal: Signal,
    handle: JoinHandle<()>,
}

impl<S: Store> FiltersManager<S> {
    /// Creates a new manager for the given shard and, unless disabled,
    /// spawns its polling loop.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(store: S, shard: ShardId, config: FiltersConfig) -> Self {
        let inner = Arc::new(ManagerInner {
            store,
            shard,
            registry: Mutex::new(Registry::default()),
            poll_task: parking_lot::Mutex::new(None),
        });
        let this = Self { inner };

        if config.poll_enabled {
            let (signal, shutdown) = signal();
            let manager = this.clone();
            let interval = config.poll_interval;
            let handle = tokio::spawn(async move { manager.poll_loop(interval, shutdown).await });
            *this.inner.poll_task.lock() = Some(PollTask { signal, handle });
        }

        this
    }

    /// The shard this manager tails.
    pub fn shard(&self) -> ShardId {
        self.inner.shard
    }

    /// Stops the polling loop and waits for it to exit.
    ///
    /// Installed filters and listeners are not removed; their forwarding
    /// consumers end when the corresponding removal call closes the queue.
    pub async fn shutdown(&self) {
        let task = self.inner.poll_task.lock().take();
        if let Some(PollTask { signal, handle }) = task {
            signal.fire();
            let _ = handle.await;
        }
    }

    /// Installs a new log filter and returns its id together with the
    /// receiving end of its delivery queue.
    ///
    /// If the query carries a range field the historical range is scanned
    /// synchronously while the registry lock is held, so the queue is
    /// already populated with historical matches on return. A store error
    /// during that scan surfaces here and the filter is not installed.
    pub async fn new_filter(
        &self,
        query: FilterQuery,
    ) -> Result<(FilterId, mpsc::Receiver<MetaLog>), FilterError> {
        query.validate()?;

        let id = next_subscription_id();
        let (tx, rx) = mpsc::channel(DELIVERY_QUEUE_CAPACITY);

        let mut registry = self.inner.registry.lock().await;
        if query.from_block.is_some() || query.to_block.is_some() {
            self.scan_range(&query, &tx).await?;
        }
        registry.filters.insert(id.clone(), ActiveFilter { query, tx });
        drop(registry);

        Ok((id, rx))
    }

    /// Removes a log filter, closing its delivery queue.
    ///
    /// Returns whether the filter existed. The queue is closed under the
    /// registry lock, so a concurrent polling tick can never deliver into a
    /// filter that is already uninstalled.
    pub async fn remove_filter(&self, id: &FilterId) -> bool {
        self.inner.registry.lock().await.filters.remove(id).is_some()
    }

    /// Registers a listener that receives every newly discovered block.
    ///
    /// Listeners are tail-only: there is no historical backfill. Delivery is
    /// best-effort; blocks are dropped for a listener whose queue is full.
    pub async fn add_block_listener(&self) -> (FilterId, mpsc::Receiver<Block>) {
        let id = next_subscription_id();
        let (tx, rx) = mpsc::channel(DELIVERY_QUEUE_CAPACITY);
        self.inner.registry.lock().await.block_subs.insert(id.clone(), tx);
        (id, rx)
    }

    /// Removes a block listener, closing its delivery queue. Returns whether
    /// it existed.
    pub async fn remove_block_listener(&self, id: &FilterId) -> bool {
        self.inner.registry.lock().await.block_subs.remove(id).is_some()
    }

    async fn poll_loop(&self, interval: Duration, mut shutdown: Shutdown) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = &mut shutdown => return,
                _ = ticker.tick() => {}
            }
            self.poll_once().await;
        }
    }

    /// Runs one block discovery pass.
    ///
    /// Reads the shard's tip hash and, if it moved, walks parent-hash links
    /// newest to oldest until the previous cursor position (or genesis),
    /// delivering every walked block. Newly discovered blocks therefore
    /// reach listeners and filters in descending height order within one
    /// pass. Any read failure abandons the pass without advancing the
    /// cursor; the same gap is retried on the next tick.
    pub async fn poll_once(&self) {
        let tip = match self.tip_hash() {
            Ok(tip) => tip,
            Err(err) => {
                if !err.is_not_found() {
                    warn!(target: "rpc::eth::filter", %err, "failed to read chain tip");
                }
                return;
            }
        };

        let mut registry = self.inner.registry.lock().await;
        if registry.last_hash == tip {
            return;
        }

        let mut curr = tip;
        while curr != registry.last_hash {
            let (block, receipts) = match self.block_with_receipts(curr) {
                Ok(read) => read,
                Err(err) => {
                    warn!(
                        target: "rpc::eth::filter",
                        %err,
                        hash = %curr,
                        "block walk failed, retrying next tick"
                    );
                    return;
                }
            };

            for listener in registry.block_subs.values() {
                // A slow or disconnected listener must never stall the loop.
                let _ = listener.try_send(block.clone());
            }
            Self::process(&registry, &block, &receipts).await;

            curr = block.parent_hash;
            if curr == B256::ZERO {
                break;
            }
        }
        registry.last_hash = tip;
    }

    /// Matches one block's receipts against every installed filter.
    ///
    /// Filter delivery blocks on a full queue, stalling the caller until the
    /// slow consumer drains or the filter is removed.
    async fn process(registry: &Registry, block: &Block, receipts: &[Receipt]) {
        for filter in registry.filters.values() {
            Self::process_filter(filter, block, receipts).await;
        }
    }

    async fn process_filter(filter: &ActiveFilter, block: &Block, receipts: &[Receipt]) {
        if let Some(to_block) = filter.query.to_block {
            if U256::from(block.number) > to_block {
                return;
            }
        }
        for receipt in receipts {
            for log in &receipt.logs {
                if filter.query.matches(receipt.contract_address, log) {
                    let meta = MetaLog { log: log.clone(), block_number: block.number };
                    let _ = filter.tx.send(meta).await;
                }
            }
        }
    }

    /// Scans `[from_block, to_block]` against the store once, pushing every
    /// match into the new filter's queue in ascending block order.
    async fn scan_range(
        &self,
        query: &FilterQuery,
        tx: &mpsc::Sender<MetaLog>,
    ) -> Result<(), StoreError> {
        let reader = self.inner.store.reader()?;

        let from = query.from_block.map(block_number_of).unwrap_or(0);
        let to = match query.to_block {
            Some(to_block) => block_number_of(to_block),
            None => reader.latest_block(self.inner.shard)?.number,
        };

        for number in from..=to {
            let block = reader.block_by_number(self.inner.shard, number)?;
            let receipts = reader.receipts_by_root(block.receipts_root)?;
            for receipt in &receipts {
                for log in &receipt.logs {
                    if query.matches(receipt.contract_address, log) {
                        let meta = MetaLog { log: log.clone(), block_number: block.number };
                        let _ = tx.send(meta).await;
                    }
                }
            }
        }
        Ok(())
    }

    fn tip_hash(&self) -> Result<B256, StoreError> {
        self.inner.store.reader()?.tip_hash(self.inner.shard)
    }

    fn block_with_receipts(&self, hash: B256) -> Result<(Block, Vec<Receipt>), StoreError> {
        let reader = self.inner.store.reader()?;
        let block = reader.block_by_hash(self.inner.shard, hash)?;
        let receipts = reader.receipts_by_root(block.receipts_root)?;
        Ok((block, receipts))
    }
}

fn block_number_of(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
