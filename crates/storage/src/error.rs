/// Errors returned by read-only store access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested key does not exist.
    ///
    /// Callers walking the chain tip treat this as transient: a shard that
    /// has not committed any block yet, or a block not yet visible in the
    /// current snapshot.
    #[error("key not found")]
    KeyNotFound,
    /// The underlying database failed.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Returns true if the error is a missing-key condition rather than a
    /// database failure.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }
}
