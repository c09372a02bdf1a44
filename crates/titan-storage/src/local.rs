use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use titan_core::models::guess_content_type;
use titan_core::{ListOptions, ObjectEntry, ObjectMetadata, SortOrder};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// The base directory plays the role of the bucket; folders are its direct
/// sub-directories. Files are expected to be served under `base_url`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/titan/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8080/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys with traversal sequences and keys whose existing parent
    /// resolves outside the base directory (symlinks).
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        let existing = if path.exists() {
            Some(path.as_path())
        } else {
            path.parent().filter(|parent| parent.exists())
        };
        if let Some(existing) = existing {
            let canonical = existing.canonicalize()?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn prefix_to_path(&self, prefix: &str) -> StorageResult<PathBuf> {
        if prefix.is_empty() {
            Ok(self.base_path.clone())
        } else {
            self.key_to_path(prefix)
        }
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), encoded.join("/"))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_new(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(data).await?;
        file.sync_all().await
    }
}

fn system_time_to_utc(time: std::io::Result<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl Storage for LocalStorage {
    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<Vec<ObjectEntry>> {
        let dir = self.prefix_to_path(prefix)?;
        let start = std::time::Instant::now();

        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::ListFailed(format!(
                    "Failed to read directory {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().await?;

            if meta.is_dir() {
                entries.push(ObjectEntry {
                    name,
                    id: None,
                    created_at: None,
                    updated_at: None,
                    metadata: None,
                });
                continue;
            }

            let created_at = system_time_to_utc(meta.created())
                .or_else(|| system_time_to_utc(meta.modified()));
            let key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            entries.push(ObjectEntry {
                id: Some(key),
                created_at,
                updated_at: system_time_to_utc(meta.modified()),
                metadata: Some(ObjectMetadata {
                    size: Some(meta.len()),
                    mimetype: Some(guess_content_type(&name).to_string()),
                }),
                name,
            });
        }

        // Folders have no timestamp and sort after files in both directions.
        entries.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => {
                let by_time = match options.created_order {
                    SortOrder::Asc => x.cmp(&y),
                    SortOrder::Desc => y.cmp(&x),
                };
                by_time.then_with(|| a.name.cmp(&b.name))
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });

        let entries: Vec<ObjectEntry> = entries
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect();

        tracing::info!(
            path = %dir.display(),
            prefix = %prefix,
            count = entries.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(entries)
    }

    async fn upload(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        if let Err(e) = Self::write_new(&path, &data).await {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                return Err(StorageError::AlreadyExists(storage_key.to_string()));
            }
            // Never leave a truncated object behind.
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(storage_key.to_string())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:8080/media".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_upload_and_list() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let key = storage
            .upload("general/a.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(key, "general/a.png");

        let entries = storage.list("general", ListOptions::default()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.png");
        assert!(entries[0].is_file());
        assert_eq!(entries[0].metadata.as_ref().unwrap().size, Some(3));
        assert!(entries[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_local_storage_never_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("general/a.png", "image/png", Bytes::from_static(b"first"))
            .await
            .unwrap();
        let result = storage
            .upload("general/a.png", "image/png", Bytes::from_static(b"second"))
            .await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        let content = std::fs::read(dir.path().join("general/a.png")).unwrap();
        assert_eq!(content, b"first");
    }

    #[tokio::test]
    async fn test_local_storage_lists_folders_without_id() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("logos/acme.svg", "image/svg+xml", Bytes::from_static(b"<svg/>"))
            .await
            .unwrap();
        storage
            .upload("root.txt", "text/plain", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let entries = storage.list("", ListOptions::default()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "root.txt");
        assert!(entries[0].is_file());
        assert_eq!(entries[1].name, "logos");
        assert!(!entries[1].is_file());
    }

    #[tokio::test]
    async fn test_local_storage_missing_folder_is_empty() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let entries = storage.list("videos", ListOptions::default()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_local_storage_list_respects_limit_and_offset() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        for name in ["a.png", "b.png", "c.png"] {
            storage
                .upload(&format!("general/{}", name), "image/png", Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        let options = ListOptions {
            limit: 2,
            offset: 1,
            ..ListOptions::default()
        };
        let entries = storage.list("general", options).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.list("../../etc", ListOptions::default()).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .upload("/etc/passwd", "text/plain", Bytes::from_static(b"x"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("general/a.png", "image/png", Bytes::from_static(b"x"))
            .await
            .unwrap();
        storage.delete("general/a.png").await.unwrap();

        let entries = storage.list("general", ListOptions::default()).await.unwrap();
        assert!(entries.is_empty());

        let result = storage.delete("general/a.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_storage_public_url() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:8080/media/".to_string())
            .await
            .unwrap();

        assert_eq!(
            storage.public_url("general/my logo.png"),
            "http://localhost:8080/media/general/my%20logo.png"
        );
    }
}
