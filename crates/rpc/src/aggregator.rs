use crate::{FilterError, FiltersManager};
use filament_primitives::Block;
use filament_rpc_types::{FilterChanges, FilterId, FilterQuery, MetaLog};
use filament_storage::Store;
use parking_lot::Mutex;
use std::{collections::HashMap, mem, sync::Arc};

/// Buffers filter deliveries between polls of the `eth_getFilterChanges`
/// surface.
///
/// The [`FiltersManager`] pushes matches into per-filter queues as blocks are
/// discovered; a forwarding task per filter drains its queue into an
/// accumulation buffer here. Reading a buffer empties it, so every match is
/// returned at most once.
pub struct LogsAggregator<S> {
    manager: FiltersManager<S>,
    logs: Arc<Mutex<HashMap<FilterId, Vec<MetaLog>>>>,
    blocks: Arc<Mutex<HashMap<FilterId, Vec<Block>>>>,
}

impl<S: Store> LogsAggregator<S> {
    /// Wraps a manager with poll buffers.
    pub fn new(manager: FiltersManager<S>) -> Self {
        Self {
            manager,
            logs: Arc::new(Mutex::new(HashMap::new())),
            blocks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Installs a log filter and starts forwarding its matches into a buffer.
    ///
    /// The buffer entry is created before any match can arrive, so a fresh
    /// filter polls as empty rather than unknown.
    pub async fn new_log_filter(&self, query: FilterQuery) -> Result<FilterId, FilterError> {
        let (id, mut rx) = self.manager.new_filter(query).await?;
        self.logs.lock().insert(id.clone(), Vec::new());

        let buffers = Arc::clone(&self.logs);
        let filter_id = id.clone();
        tokio::spawn(async move {
            while let Some(log) = rx.recv().await {
                let mut buffers = buffers.lock();
                match buffers.get_mut(&filter_id) {
                    Some(buf) => buf.push(log),
                    // Uninstalled mid-delivery.
                    None => return,
                }
            }
        });

        Ok(id)
    }

    /// Installs a block filter and starts forwarding new blocks into a
    /// buffer.
    pub async fn new_block_filter(&self) -> FilterId {
        let (id, mut rx) = self.manager.add_block_listener().await;
        self.blocks.lock().insert(id.clone(), Vec::new());

        let buffers = Arc::clone(&self.blocks);
        let filter_id = id.clone();
        tokio::spawn(async move {
            while let Some(block) = rx.recv().await {
                let mut buffers = buffers.lock();
                match buffers.get_mut(&filter_id) {
                    Some(buf) => buf.push(block),
                    None => return,
                }
            }
        });

        id
    }

    /// Drains everything accumulated for the filter since the previous read.
    ///
    /// Works for both log and block filters; unknown ids are an error.
    pub fn filter_changes(&self, id: &FilterId) -> Result<FilterChanges, FilterError> {
        if let Some(buf) = self.logs.lock().get_mut(id) {
            let drained = mem::take(buf);
            return Ok(if drained.is_empty() {
                FilterChanges::Empty
            } else {
                FilterChanges::Logs(drained)
            });
        }
        if let Some(buf) = self.blocks.lock().get_mut(id) {
            let drained = mem::take(buf);
            return Ok(if drained.is_empty() {
                FilterChanges::Empty
            } else {
                FilterChanges::Blocks(drained)
            });
        }
        Err(FilterError::FilterNotFound(id.clone()))
    }

    /// Drains the accumulated matches of a log filter.
    ///
    /// Block filter ids are rejected: only log filters carry logs.
    pub fn filter_logs(&self, id: &FilterId) -> Result<Vec<MetaLog>, FilterError> {
        match self.logs.lock().get_mut(id) {
            Some(buf) => Ok(mem::take(buf)),
            None => Err(FilterError::FilterNotFound(id.clone())),
        }
    }

    /// Uninstalls a log or block filter. Returns whether it existed.
    ///
    /// The manager side closes the delivery queue, which ends the forwarding
    /// task; the buffer and whatever it still holds are dropped here.
    pub async fn uninstall(&self, id: &FilterId) -> bool {
        if self.manager.remove_filter(id).await {
            self.logs.lock().remove(id);
            return true;
        }
        if self.manager.remove_block_listener(id).await {
            self.blocks.lock().remove(id);
            return true;
        }
        false
    }

    /// The wrapped manager.
    pub fn manager(&self) -> &FiltersManager<S> {
        &self.manager
    }

    /// Stops the underlying polling loop.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FiltersConfig;
    use filament_primitives::{Address, Log, Receipt, ShardId};
    use std::time::Duration;

    fn aggregator() -> (LogsAggregator<filament_storage::MemStore>, filament_storage::MemStore) {
        let store = filament_storage::MemStore::new();
        let manager = FiltersManager::new(
            store.clone(),
            ShardId::MAIN,
            FiltersConfig { poll_enabled: false, ..Default::default() },
        );
        (LogsAggregator::new(manager), store)
    }

    /// Retries until the forwarding tasks have caught up.
    async fn wait_for<T>(mut poll: impl FnMut() -> Option<T>) -> T {
        for _ in 0..200 {
            if let Some(out) = poll() {
                return out;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("forwarding did not catch up");
    }

    fn receipt_with_log(address: Address) -> Receipt {
        Receipt {
            contract_address: address,
            logs: vec![Log { address, ..Default::default() }],
        }
    }

    #[tokio::test]
    async fn fresh_filter_polls_empty() {
        let (aggregator, _store) = aggregator();
        let id = aggregator.new_log_filter(FilterQuery::default()).await.unwrap();
        assert_eq!(aggregator.filter_changes(&id).unwrap(), FilterChanges::Empty);
    }

    #[tokio::test]
    async fn changes_drain_on_read() {
        let (aggregator, store) = aggregator();
        let address = Address::repeat_byte(0x11);
        let id = aggregator.new_log_filter(FilterQuery::default()).await.unwrap();

        store.append_block(ShardId::MAIN, vec![receipt_with_log(address)]);
        aggregator.manager().poll_once().await;

        let changes = wait_for(|| match aggregator.filter_changes(&id) {
            Ok(FilterChanges::Empty) => None,
            other => Some(other),
        })
        .await
        .unwrap();
        match changes {
            FilterChanges::Logs(logs) => assert_eq!(logs.len(), 1),
            other => panic!("expected logs, got {other:?}"),
        }

        // Already drained.
        assert_eq!(aggregator.filter_changes(&id).unwrap(), FilterChanges::Empty);
    }

    #[tokio::test]
    async fn block_filter_accumulates_blocks() {
        let (aggregator, store) = aggregator();
        let id = aggregator.new_block_filter().await;

        let b0 = store.append_block(ShardId::MAIN, vec![]);
        let b1 = store.append_block(ShardId::MAIN, vec![]);
        aggregator.manager().poll_once().await;

        let changes = wait_for(|| match aggregator.filter_changes(&id) {
            Ok(FilterChanges::Empty) => None,
            other => Some(other),
        })
        .await
        .unwrap();
        // Discovery walks the chain newest to oldest.
        assert_eq!(changes, FilterChanges::Blocks(vec![b1, b0]));
    }

    #[tokio::test]
    async fn unknown_id_is_an_error() {
        let (aggregator, _store) = aggregator();
        let id = FilterId::from("deadbeef");
        assert!(matches!(
            aggregator.filter_changes(&id),
            Err(FilterError::FilterNotFound(_))
        ));
        assert!(matches!(aggregator.filter_logs(&id), Err(FilterError::FilterNotFound(_))));
        assert!(!aggregator.uninstall(&id).await);
    }

    #[tokio::test]
    async fn filter_logs_rejects_block_filters() {
        let (aggregator, _store) = aggregator();
        let id = aggregator.new_block_filter().await;
        assert!(matches!(aggregator.filter_logs(&id), Err(FilterError::FilterNotFound(_))));
    }

    #[tokio::test]
    async fn uninstall_forgets_the_filter() {
        let (aggregator, _store) = aggregator();

        let id = aggregator.new_log_filter(FilterQuery::default()).await.unwrap();
        assert!(aggregator.uninstall(&id).await);
        assert!(!aggregator.uninstall(&id).await);
        assert!(matches!(
            aggregator.filter_changes(&id),
            Err(FilterError::FilterNotFound(_))
        ));

        let id = aggregator.new_block_filter().await;
        assert!(aggregator.uninstall(&id).await);
        assert!(!aggregator.uninstall(&id).await);
    }
}
