//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use titan_core::{ListOptions, ObjectEntry};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Configuration errors are raised before any backend call is attempted.
    pub fn is_config_error(&self) -> bool {
        matches!(self, StorageError::ConfigError(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The four primitives the media gateway needs from an object store. Keys are
/// folder-qualified (`{folder}/{filename}`) and relative to the configured
/// bucket.
#[async_trait]
pub trait Storage: Send + Sync {
    /// List the direct children of `prefix` (empty for the bucket root).
    ///
    /// Sub-folders are returned as entries without an `id`. Only one page is
    /// returned, as selected by `options`.
    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<Vec<ObjectEntry>>;

    /// Store `data` under `storage_key` and return the stored key.
    ///
    /// Never overwrites: an existing object at `storage_key` yields
    /// `StorageError::AlreadyExists`.
    async fn upload(&self, storage_key: &str, content_type: &str, data: Bytes)
        -> StorageResult<String>;

    /// Delete a file by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Public URL for a storage key. Pure derivation, no I/O.
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
