use thiserror::Error;
use titan_storage::StorageError;

/// Errors surfaced by the upload controller
#[derive(Debug, Error)]
pub enum UploadError {
    /// Rejected before reaching the network.
    #[error("Invalid upload: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// Whether the same draft can be submitted again. Configuration and
    /// validation problems will not go away on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Validation(_) => false,
            UploadError::Storage(e) => !e.is_config_error(),
        }
    }
}
