//! Titan Storage Library
//!
//! This crate provides the storage abstraction for the media gallery: the
//! `Storage` trait, its backends (Supabase Storage REST API, local filesystem,
//! in-memory) and the `StorageGateway` the media components go through.
//!
//! # Storage key format
//!
//! Keys are relative to the bucket and folder-qualified: `{folder}/{filename}`,
//! one folder level deep. Uploads generate `{folder}/{millis}-{token}.{ext}`.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in
//! the `keys` module so all backends stay consistent.

pub mod factory;
pub mod gateway;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use factory::create_gateway;
pub use gateway::{FolderProbe, StorageGateway};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use titan_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
