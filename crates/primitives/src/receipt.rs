use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// An event emitted by a contract during execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Address of the contract that emitted the event.
    pub address: Address,
    /// Indexed event topics, up to four entries.
    pub topics: Vec<B256>,
    /// Unindexed event payload.
    pub data: Bytes,
}

/// The result of executing a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Address of the contract the transaction was executed against.
    pub contract_address: Address,
    /// Logs emitted during execution, in emission order.
    pub logs: Vec<Log>,
}
