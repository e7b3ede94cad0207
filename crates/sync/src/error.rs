use boardsync_core::error::CoreError;

/// Error type of every sync operation.
///
/// Domain failures stay [`CoreError`]; anything the store could not commit
/// is [`SyncError::Storage`], in which case nothing was persisted.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl SyncError {
    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core) => Some(core),
            Self::Storage(_) => None,
        }
    }
}
