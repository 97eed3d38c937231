use crate::{FilterError, LogsAggregator};
use async_trait::async_trait;
use filament_rpc_api::EthFilterApiServer;
use filament_rpc_types::{FilterChanges, FilterId, FilterQuery, MetaLog};
use filament_storage::Store;
use jsonrpsee::core::RpcResult;
use std::sync::Arc;
use tracing::trace;

/// `Eth` filter API implementation.
///
/// Handles `eth_newFilter`, `eth_getFilterChanges` and related methods on
/// top of a [`LogsAggregator`]. Log filter ids are exposed with a `0x`
/// prefix; block filter ids without one.
pub struct EthFilter<S> {
    inner: Arc<LogsAggregator<S>>,
}

impl<S> EthFilter<S> {
    /// Creates a new handler over the given aggregator.
    pub fn new(inner: Arc<LogsAggregator<S>>) -> Self {
        Self { inner }
    }
}

impl<S> Clone for EthFilter<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

/// Accepts filter ids with or without the `0x` prefix.
fn parse_id(id: &str) -> FilterId {
    FilterId::from(id.trim_start_matches("0x"))
}

#[async_trait]
impl<S: Store> EthFilterApiServer for EthFilter<S> {
    async fn new_filter(&self, query: FilterQuery) -> RpcResult<String> {
        trace!(target: "rpc::eth", ?query, "Serving eth_newFilter");
        let id = self.inner.new_log_filter(query).await?;
        Ok(format!("0x{id}"))
    }

    async fn new_block_filter(&self) -> RpcResult<String> {
        trace!(target: "rpc::eth", "Serving eth_newBlockFilter");
        Ok(self.inner.new_block_filter().await.to_string())
    }

    async fn new_pending_transaction_filter(&self) -> RpcResult<String> {
        trace!(target: "rpc::eth", "Serving eth_newPendingTransactionFilter");
        Err(FilterError::NotImplemented.into())
    }

    async fn uninstall_filter(&self, id: String) -> RpcResult<bool> {
        trace!(target: "rpc::eth", %id, "Serving eth_uninstallFilter");
        Ok(self.inner.uninstall(&parse_id(&id)).await)
    }

    async fn filter_changes(&self, id: String) -> RpcResult<FilterChanges> {
        trace!(target: "rpc::eth", %id, "Serving eth_getFilterChanges");
        Ok(self.inner.filter_changes(&parse_id(&id))?)
    }

    async fn filter_logs(&self, id: String) -> RpcResult<Vec<MetaLog>> {
        trace!(target: "rpc::eth", %id, "Serving eth_getFilterLogs");
        Ok(self.inner.filter_logs(&parse_id(&id))?)
    }
}
