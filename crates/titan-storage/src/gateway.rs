//! Media-facing storage gateway.
//!
//! `StorageGateway` is the only way the media components reach the bucket. It
//! turns raw backend listings into [`MediaObject`]s, generates upload keys, and
//! implements the degraded mode used when no backend is configured: reads
//! return empty listings while writes fail before touching the network.

use crate::keys::{full_path, generate_object_key, normalize_folder, validate_key};
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use titan_core::constants::{DEFAULT_UPLOAD_FOLDER, LIST_PAGE_LIMIT};
use titan_core::{ListOptions, LocalFile, MediaObject, ObjectEntry, UploadedObject};

const NOT_CONFIGURED: &str =
    "Storage is not configured. Define SUPABASE_URL and SUPABASE_ANON_KEY.";

/// Outcome of probing one folder, as reported by [`StorageGateway::diagnose`].
#[derive(Debug, Clone, Serialize)]
pub struct FolderProbe {
    pub folder: String,
    /// Raw entries returned by the backend, sub-folders included.
    pub entries: usize,
    pub files: usize,
    pub sub_folders: Vec<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct StorageGateway {
    storage: Option<Arc<dyn Storage>>,
    list_limit: usize,
}

impl StorageGateway {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
            list_limit: LIST_PAGE_LIMIT,
        }
    }

    /// Gateway without a backend (degraded mode).
    pub fn unconfigured() -> Self {
        Self {
            storage: None,
            list_limit: LIST_PAGE_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.storage.is_some()
    }

    /// Backend behind the gateway, `None` when unconfigured.
    pub fn backend_type(&self) -> Option<StorageBackend> {
        self.storage.as_ref().map(|storage| storage.backend_type())
    }

    fn backend(&self) -> StorageResult<&Arc<dyn Storage>> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::ConfigError(NOT_CONFIGURED.to_string()))
    }

    /// List the files of `folder` (empty for the bucket root), most recent first.
    ///
    /// Only the first page is fetched. Sub-folders are dropped. When the
    /// gateway is unconfigured the listing is empty.
    pub async fn list(&self, folder: &str) -> StorageResult<Vec<MediaObject>> {
        let Some(storage) = &self.storage else {
            tracing::warn!(folder = %folder, "Storage is not configured; returning empty media list");
            return Ok(Vec::new());
        };

        let folder = normalize_folder(folder)?;
        let options = ListOptions {
            limit: self.list_limit,
            ..ListOptions::default()
        };

        tracing::debug!(folder = %folder, limit = options.limit, "Listing media");

        let entries = storage.list(&folder, options).await.map_err(|e| {
            tracing::error!(folder = %folder, error = %e, "Failed to list media");
            e
        })?;
        let raw_count = entries.len();

        let objects: Vec<MediaObject> = entries
            .into_iter()
            .filter(ObjectEntry::is_file)
            .map(|entry| self.to_media_object(storage.as_ref(), &folder, entry))
            .collect();

        tracing::info!(
            folder = %folder,
            raw_count = raw_count,
            count = objects.len(),
            "Listed media"
        );

        Ok(objects)
    }

    fn to_media_object(&self, storage: &dyn Storage, folder: &str, entry: ObjectEntry) -> MediaObject {
        let full_path = full_path(folder, &entry.name);
        let (size_bytes, content_type) = match entry.metadata {
            Some(meta) => (meta.size, meta.mimetype),
            None => (None, None),
        };
        MediaObject {
            public_url: storage.public_url(&full_path),
            created_at: entry
                .created_at
                .or(entry.updated_at)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            name: entry.name,
            full_path,
            size_bytes,
            content_type,
        }
    }

    /// Upload `file` into `folder` (default `general`) under a fresh key.
    pub async fn upload(&self, file: &LocalFile, folder: Option<&str>) -> StorageResult<UploadedObject> {
        let storage = self.backend()?;
        let folder = normalize_folder(folder.unwrap_or(DEFAULT_UPLOAD_FOLDER))?;
        let key = generate_object_key(&folder, file.extension());

        tracing::info!(
            folder = %folder,
            key = %key,
            file_name = %file.name,
            size_bytes = file.size(),
            "Uploading media"
        );

        let path = storage
            .upload(&key, &file.content_type, file.data.clone())
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Media upload failed");
                e
            })?;

        Ok(UploadedObject {
            public_url: storage.public_url(&path),
            path,
        })
    }

    /// Delete one object by its full path.
    pub async fn remove(&self, path: &str) -> StorageResult<()> {
        let storage = self.backend()?;
        validate_key(path)?;

        storage.delete(path).await.map_err(|e| {
            tracing::error!(path = %path, error = %e, "Media delete failed");
            e
        })?;

        tracing::info!(path = %path, "Deleted media");
        Ok(())
    }

    /// Public URL for a full path. No I/O. `None` when unconfigured.
    pub fn public_url_for(&self, path: &str) -> Option<String> {
        self.storage.as_ref().map(|storage| storage.public_url(path))
    }

    /// Probe the bucket root and each of `folders`, reporting what the backend
    /// returns without failing on individual errors.
    pub async fn diagnose(&self, folders: &[&str]) -> StorageResult<Vec<FolderProbe>> {
        let storage = self.backend()?;
        let mut probes = Vec::with_capacity(folders.len() + 1);

        for folder in std::iter::once("").chain(folders.iter().copied()) {
            let probe = match storage.list(folder, ListOptions::default()).await {
                Ok(entries) => FolderProbe {
                    folder: folder.to_string(),
                    entries: entries.len(),
                    files: entries.iter().filter(|e| e.is_file()).count(),
                    sub_folders: entries
                        .iter()
                        .filter(|e| !e.is_file())
                        .map(|e| e.name.clone())
                        .collect(),
                    error: None,
                },
                Err(e) => FolderProbe {
                    folder: folder.to_string(),
                    entries: 0,
                    files: 0,
                    sub_folders: Vec::new(),
                    error: Some(e.to_string()),
                },
            };
            tracing::info!(
                folder = %probe.folder,
                entries = probe.entries,
                files = probe.files,
                error = ?probe.error,
                "Storage probe"
            );
            probes.push(probe);
        }

        Ok(probes)
    }
}
