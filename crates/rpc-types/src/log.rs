use filament_primitives::{BlockNumber, Log};
use serde::{Deserialize, Serialize};

/// A matched log together with the block it was emitted in; the unit of
/// delivery for log filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaLog {
    /// The matched log entry.
    #[serde(flatten)]
    pub log: Log,
    /// Height of the block whose receipts contained the log.
    pub block_number: BlockNumber,
}
