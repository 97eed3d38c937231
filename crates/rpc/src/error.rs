use filament_rpc_types::{FilterId, QueryError};
use filament_storage::StoreError;
use jsonrpsee::types::error::{CallError, ErrorCode, ErrorObject, INVALID_PARAMS_CODE};

/// Errors returned by the filter RPC surface.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The subscription id is unknown to both the filter map and the
    /// listener map.
    #[error("filter does not exist: {0}")]
    FilterNotFound(FilterId),
    /// The query failed validation and never entered the registry.
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    /// Pending transaction filters share the token namespace but are not
    /// implemented by this node.
    #[error("pending transaction filters are not implemented")]
    NotImplemented,
    /// The backfill scan hit a hard store error; the filter was not
    /// installed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FilterError> for jsonrpsee::core::Error {
    fn from(err: FilterError) -> Self {
        let code = match &err {
            FilterError::FilterNotFound(_) | FilterError::InvalidQuery(_) => INVALID_PARAMS_CODE,
            FilterError::NotImplemented => ErrorCode::MethodNotFound.code(),
            FilterError::Store(_) => ErrorCode::InternalError.code(),
        };
        rpc_err(code, err.to_string())
    }
}

/// Constructs a typed JSON-RPC call error.
fn rpc_err(code: i32, msg: impl Into<String>) -> jsonrpsee::core::Error {
    jsonrpsee::core::Error::Call(CallError::Custom(ErrorObject::owned(code, msg.into(), None::<()>)))
}
