use filament_rpc_types::{FilterChanges, FilterQuery, MetaLog};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

/// Rpc interface for the poll-based ethereum filter API.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "eth"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "eth"))]
pub trait EthFilterApi {
    /// Creates a new log filter and returns its id.
    #[method(name = "newFilter")]
    async fn new_filter(&self, query: FilterQuery) -> RpcResult<String>;

    /// Creates a new block filter and returns its id.
    #[method(name = "newBlockFilter")]
    async fn new_block_filter(&self) -> RpcResult<String>;

    /// Creates a pending transaction filter and returns its id.
    #[method(name = "newPendingTransactionFilter")]
    async fn new_pending_transaction_filter(&self) -> RpcResult<String>;

    /// Uninstalls the filter with the given id.
    #[method(name = "uninstallFilter")]
    async fn uninstall_filter(&self, id: String) -> RpcResult<bool>;

    /// Returns all filter changes since the last poll.
    #[method(name = "getFilterChanges")]
    async fn filter_changes(&self, id: String) -> RpcResult<FilterChanges>;

    /// Returns the accumulated logs of a log filter since the last poll.
    #[method(name = "getFilterLogs")]
    async fn filter_logs(&self, id: String) -> RpcResult<Vec<MetaLog>>;
}
