//! Titan Core Library
//!
//! This crate provides the domain models, constants and configuration shared by
//! the storage gateway, the media components and the admin CLI.

pub mod config;
pub mod constants;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::StorageConfig;
pub use models::{
    format_file_size, ListOptions, LocalFile, MediaKind, MediaObject, ObjectEntry,
    ObjectMetadata, SortOrder, UploadedObject,
};
pub use storage_types::StorageBackend;
