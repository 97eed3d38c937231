//! End-to-end tests driving the `eth_` filter API against a live polling
//! loop over an in-memory chain.

use filament_primitives::{Address, Bytes, Log, Receipt, ShardId, B256, U256};
use filament_rpc::{EthFilter, FiltersConfig, FiltersManager, LogsAggregator};
use filament_rpc_api::EthFilterApiServer;
use filament_rpc_types::{FilterChanges, FilterQuery, MetaLog};
use filament_storage::MemStore;
use jsonrpsee::{core::Error as RpcError, types::error::CallError};
use std::{sync::Arc, time::Duration};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

struct TestNode {
    store: MemStore,
    aggregator: Arc<LogsAggregator<MemStore>>,
    api: EthFilter<MemStore>,
}

impl TestNode {
    fn new() -> Self {
        let store = MemStore::new();
        let manager = FiltersManager::new(
            store.clone(),
            ShardId::MAIN,
            FiltersConfig { poll_interval: POLL_INTERVAL, poll_enabled: true },
        );
        let aggregator = Arc::new(LogsAggregator::new(manager));
        let api = EthFilter::new(Arc::clone(&aggregator));
        Self { store, aggregator, api }
    }

    /// Polls `eth_getFilterChanges` until it returns something non-empty.
    async fn wait_for_changes(&self, id: &str) -> FilterChanges {
        for _ in 0..400 {
            match self.api.filter_changes(id.to_owned()).await {
                Ok(FilterChanges::Empty) => {}
                Ok(changes) => return changes,
                Err(err) => panic!("unexpected error while waiting: {err}"),
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no changes observed for filter {id}");
    }

    async fn shutdown(self) {
        self.aggregator.shutdown().await;
    }
}

fn receipt(address: Address, first_topic: u8) -> Receipt {
    Receipt {
        contract_address: address,
        logs: vec![Log {
            address,
            topics: vec![B256::with_last_byte(first_topic)],
            data: Bytes::from(vec![first_topic]),
        }],
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn tails_new_logs_end_to_end() {
    let node = TestNode::new();
    let address = Address::repeat_byte(0x11);

    let id = node.api.new_filter(FilterQuery::default()).await.unwrap();
    assert!(id.starts_with("0x"));
    assert_eq!(id.len(), 34);

    node.store.append_block(ShardId::MAIN, vec![receipt(address, 1)]);
    let logs = node.wait_for_changes(&id).await.into_logs().expect("log filter yields logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].block_number, 0);
    assert_eq!(logs[0].log.address, address);

    // Drained: an immediate re-poll is empty.
    assert_eq!(node.api.filter_changes(id.clone()).await.unwrap(), FilterChanges::Empty);

    // The next block produces the next batch.
    node.store.append_block(ShardId::MAIN, vec![receipt(address, 2)]);
    let logs = node.wait_for_changes(&id).await.into_logs().expect("log filter yields logs");
    assert_eq!(logs, vec![MetaLog {
        log: Log {
            address,
            topics: vec![B256::with_last_byte(2)],
            data: Bytes::from(vec![2]),
        },
        block_number: 1,
    }]);

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn block_filter_reports_new_blocks() {
    let node = TestNode::new();

    assert_eq!(node.aggregator.manager().shard(), ShardId::MAIN);

    let id = node.api.new_block_filter().await.unwrap();
    assert!(!id.starts_with("0x"));

    let b0 = node.store.append_block(ShardId::MAIN, vec![]);
    let b1 = node.store.append_block(ShardId::MAIN, vec![]);

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let blocks =
            node.wait_for_changes(&id).await.into_blocks().expect("block filter yields blocks");
        seen.extend(blocks);
    }
    assert!(seen.contains(&b0));
    assert!(seen.contains(&b1));

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn backfills_historical_range_on_creation() {
    let node = TestNode::new();
    let address = Address::repeat_byte(0x22);

    for topic in 1..=4 {
        node.store.append_block(ShardId::MAIN, vec![receipt(address, topic)]);
    }

    let query = FilterQuery {
        from_block: Some(U256::from(1)),
        to_block: Some(U256::from(2)),
        addresses: vec![address],
        ..Default::default()
    };
    let id = node.api.new_filter(query).await.unwrap();

    // Historical matches are queued synchronously at creation, no tick needed
    // for them, only for the forwarding task to drain the queue.
    let logs = node.wait_for_changes(&id).await.into_logs().expect("log filter yields logs");
    assert_eq!(logs.iter().map(|l| l.block_number).collect::<Vec<_>>(), vec![1, 2]);

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn get_filter_logs_drains_log_filters_only() {
    let node = TestNode::new();
    let address = Address::repeat_byte(0x33);

    let id = node.api.new_filter(FilterQuery::default()).await.unwrap();
    node.store.append_block(ShardId::MAIN, vec![receipt(address, 1)]);

    let mut logs = Vec::new();
    for _ in 0..400 {
        logs = node.api.filter_logs(id.clone()).await.unwrap();
        if !logs.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(logs.len(), 1);
    assert!(node.api.filter_logs(id).await.unwrap().is_empty());

    let block_id = node.api.new_block_filter().await.unwrap();
    assert!(node.api.filter_logs(block_id).await.is_err());

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn uninstall_is_terminal() {
    let node = TestNode::new();

    let id = node.api.new_filter(FilterQuery::default()).await.unwrap();
    assert!(node.api.uninstall_filter(id.clone()).await.unwrap());
    assert!(!node.api.uninstall_filter(id.clone()).await.unwrap());
    assert!(node.api.filter_changes(id).await.is_err());

    let id = node.api.new_block_filter().await.unwrap();
    assert!(node.api.uninstall_filter(id.clone()).await.unwrap());
    assert!(!node.api.uninstall_filter(id).await.unwrap());

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_queries_are_rejected() {
    let node = TestNode::new();

    // blockHash combined with a range field.
    let query = FilterQuery {
        block_hash: Some(B256::repeat_byte(1)),
        from_block: Some(U256::ZERO),
        ..Default::default()
    };
    assert!(node.api.new_filter(query).await.is_err());

    // Disjunction within a topic position.
    let query = FilterQuery {
        topics: vec![vec![B256::with_last_byte(1), B256::with_last_byte(2)]],
        ..Default::default()
    };
    assert!(node.api.new_filter(query).await.is_err());

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_transaction_filters_are_unsupported() {
    let node = TestNode::new();
    let err = node.api.new_pending_transaction_filter().await.unwrap_err();
    match err {
        RpcError::Call(CallError::Custom(object)) => {
            assert_eq!(object.code(), jsonrpsee::types::error::ErrorCode::MethodNotFound.code());
        }
        other => panic!("unexpected error: {other}"),
    }
    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn filter_ids_accept_both_prefix_forms() {
    let node = TestNode::new();
    let id = node.api.new_filter(FilterQuery::default()).await.unwrap();

    let bare = id.trim_start_matches("0x").to_owned();
    assert_eq!(node.api.filter_changes(bare).await.unwrap(), FilterChanges::Empty);
    assert!(node.api.uninstall_filter(id).await.unwrap());

    node.shutdown().await;
}
