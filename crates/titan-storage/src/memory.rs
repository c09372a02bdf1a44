use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use titan_core::models::guess_content_type;
use titan_core::{ListOptions, ObjectEntry, ObjectMetadata, SortOrder};

#[derive(Clone)]
struct StoredObject {
    id: String,
    data: Bytes,
    content_type: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Faults {
    /// Prefix -> message returned by `list` for that prefix.
    list: HashMap<String, String>,
    upload: Option<String>,
    delete: Option<String>,
    /// Prefix -> artificial latency applied to `list`.
    list_latency: HashMap<String, Duration>,
}

/// In-process storage
///
/// Keeps objects in memory and can be told to fail or to slow down individual
/// operations, which makes it the backend of choice for tests and demos.
#[derive(Default)]
pub struct MemoryStorage {
    base_url: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    faults: Mutex<Faults>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Insert an object with an explicit creation time, bypassing the
    /// no-overwrite check.
    pub fn insert(&self, storage_key: &str, data: impl Into<Bytes>, created_at: DateTime<Utc>) {
        let name = storage_key.rsplit('/').next().unwrap_or(storage_key);
        let object = StoredObject {
            id: self.next_object_id(),
            data: data.into(),
            content_type: guess_content_type(name).to_string(),
            created_at,
        };
        self.lock_objects().insert(storage_key.to_string(), object);
    }

    /// Make every `list` of `prefix` fail with `message`.
    pub fn fail_list(&self, prefix: &str, message: impl Into<String>) {
        self.lock_faults().list.insert(prefix.to_string(), message.into());
    }

    /// Make every `upload` fail with `message`, or succeed again with `None`.
    pub fn fail_uploads(&self, message: Option<String>) {
        self.lock_faults().upload = message;
    }

    /// Make every `delete` fail with `message`, or succeed again with `None`.
    pub fn fail_deletes(&self, message: Option<String>) {
        self.lock_faults().delete = message;
    }

    /// Delay every `list` of `prefix` by `latency`.
    pub fn set_list_latency(&self, prefix: &str, latency: Duration) {
        self.lock_faults()
            .list_latency
            .insert(prefix.to_string(), latency);
    }

    /// Number of backend operations attempted so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, storage_key: &str) -> bool {
        self.lock_objects().contains_key(storage_key)
    }

    pub fn object_count(&self) -> usize {
        self.lock_objects().len()
    }

    fn next_object_id(&self) -> String {
        format!("obj-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<Vec<ObjectEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (failure, latency) = {
            let faults = self.lock_faults();
            (
                faults.list.get(prefix).cloned(),
                faults.list_latency.get(prefix).copied(),
            )
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = failure {
            return Err(StorageError::ListFailed(message));
        }

        let folder_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        let mut files = Vec::new();
        let mut folders = Vec::new();
        for (key, object) in self.lock_objects().iter() {
            let Some(rest) = key.strip_prefix(&folder_prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((folder, _)) => {
                    if !folders.contains(&folder.to_string()) {
                        folders.push(folder.to_string());
                    }
                }
                None => files.push(ObjectEntry {
                    name: rest.to_string(),
                    id: Some(object.id.clone()),
                    created_at: Some(object.created_at),
                    updated_at: Some(object.created_at),
                    metadata: Some(ObjectMetadata {
                        size: Some(object.data.len() as u64),
                        mimetype: Some(object.content_type.clone()),
                    }),
                }),
            }
        }

        files.sort_by(|a, b| match options.created_order {
            SortOrder::Asc => a.created_at.cmp(&b.created_at),
            SortOrder::Desc => b.created_at.cmp(&a.created_at),
        });

        let entries = folders
            .into_iter()
            .map(|name| ObjectEntry {
                name,
                id: None,
                created_at: None,
                updated_at: None,
                metadata: None,
            })
            .chain(files)
            .skip(options.offset)
            .take(options.limit)
            .collect();

        Ok(entries)
    }

    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        validate_key(storage_key)?;

        if let Some(message) = self.lock_faults().upload.clone() {
            return Err(StorageError::UploadFailed(message));
        }

        let mut objects = self.lock_objects();
        if objects.contains_key(storage_key) {
            return Err(StorageError::AlreadyExists(storage_key.to_string()));
        }

        // Creation times strictly increase so recency ordering is total.
        let now = Utc::now();
        let created_at = objects
            .values()
            .map(|o| o.created_at)
            .max()
            .filter(|latest| *latest >= now)
            .map(|latest| latest + ChronoDuration::milliseconds(1))
            .unwrap_or(now);

        objects.insert(
            storage_key.to_string(),
            StoredObject {
                id: self.next_object_id(),
                data,
                content_type: content_type.to_string(),
                created_at,
            },
        );

        tracing::debug!(key = %storage_key, "Memory storage upload successful");
        Ok(storage_key.to_string())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        validate_key(storage_key)?;

        if let Some(message) = self.lock_faults().delete.clone() {
            return Err(StorageError::DeleteFailed(message));
        }

        match self.lock_objects().remove(storage_key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(storage_key.to_string())),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
