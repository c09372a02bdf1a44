//! Upload controller
//!
//! Drives one select → preview → upload interaction:
//!
//! ```text
//! Empty --select--> Selected --submit--> Uploading --ok--> Empty
//!                      ^                     |
//!                      +-------error---------+
//! ```
//!
//! `clear` returns to `Empty` from anywhere. A failed upload keeps the draft
//! so it can be submitted again without selecting the file twice.

use crate::error::UploadError;
use base64::Engine;
use std::path::Path;
use titan_core::constants::{DEFAULT_ACCEPT, DEFAULT_UPLOAD_FOLDER};
use titan_core::models::accepts;
use titan_core::{LocalFile, MediaKind, UploadedObject};
use titan_storage::StorageGateway;
use tokio::sync::watch;

type CompletionCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Destination folder.
    pub folder: String,
    /// Comma separated accept patterns (`image/*`, `video/mp4`, `.png`).
    pub accept: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Empty,
    Selected,
    Uploading,
}

/// Local rendering of a selected file; never uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub kind: MediaKind,
    /// `data:{mime};base64,...`
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDraft {
    pub file: LocalFile,
    pub kind: MediaKind,
    pub preview: Preview,
    pub uploading: bool,
}

/// Encode a file as a data URL off the async executor.
pub async fn generate_preview(file: &LocalFile) -> Preview {
    let kind = MediaKind::for_preview(&file.content_type);
    let content_type = if file.content_type.is_empty() {
        "application/octet-stream".to_string()
    } else {
        file.content_type.clone()
    };
    let data = file.data.clone();

    let encoded = tokio::task::spawn_blocking(move || {
        base64::engine::general_purpose::STANDARD.encode(&data)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Preview encoding task failed");
        String::new()
    });

    Preview {
        kind,
        data_url: format!("data:{};base64,{}", content_type, encoded),
    }
}

pub struct UploadController {
    gateway: StorageGateway,
    config: UploadConfig,
    draft: Option<UploadDraft>,
    error: Option<String>,
    on_upload_complete: Option<CompletionCallback>,
    phase: watch::Sender<UploadPhase>,
}

impl UploadController {
    pub fn new(gateway: StorageGateway, config: UploadConfig) -> Self {
        let (phase, _) = watch::channel(UploadPhase::Empty);
        Self {
            gateway,
            config,
            draft: None,
            error: None,
            on_upload_complete: None,
            phase,
        }
    }

    /// Register the callback invoked with `(public_url, path)` after each
    /// successful upload.
    pub fn on_upload_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_upload_complete = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Change the destination folder. The current draft is kept.
    pub fn set_folder(&mut self, folder: impl Into<String>) {
        self.config.folder = folder.into();
    }

    pub fn phase(&self) -> UploadPhase {
        *self.phase.borrow()
    }

    /// Receive every phase change, e.g. to show an upload spinner.
    pub fn subscribe(&self) -> watch::Receiver<UploadPhase> {
        self.phase.subscribe()
    }

    pub fn draft(&self) -> Option<&UploadDraft> {
        self.draft.as_ref()
    }

    /// Message of the last failure, cleared by the next select, submit or clear.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Select a file, replacing any current draft. No network call is made.
    ///
    /// A file outside the `accept` patterns is rejected and the previous draft
    /// is left as it was.
    pub async fn select(&mut self, file: LocalFile) -> Result<(), UploadError> {
        if !accepts(&self.config.accept, &file.content_type, &file.name) {
            let message = format!(
                "{} ({}) is not an accepted file type: {}",
                file.name, file.content_type, self.config.accept
            );
            self.error = Some(message.clone());
            return Err(UploadError::Validation(message));
        }

        self.error = None;
        let preview = generate_preview(&file).await;
        tracing::debug!(
            file_name = %file.name,
            content_type = %file.content_type,
            size_bytes = file.size(),
            "File selected for upload"
        );

        self.draft = Some(UploadDraft {
            kind: preview.kind,
            file,
            preview,
            uploading: false,
        });
        self.phase.send_replace(UploadPhase::Selected);
        Ok(())
    }

    /// Read a file from disk and select it.
    pub async fn select_path(&mut self, path: impl AsRef<Path>) -> Result<(), UploadError> {
        let path = path.as_ref();
        if path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(UploadError::Validation(format!(
                "Invalid input: {}",
                path.display()
            )));
        }

        let data = tokio::fs::read(path).await.map_err(|e| {
            UploadError::Validation(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::Validation(format!("Invalid file name: {}", path.display())))?;

        self.select(LocalFile::with_guessed_type(name, data)).await
    }

    /// Upload the selected file.
    ///
    /// On success the completion callback runs once and the controller
    /// returns to `Empty`. On failure the error message is kept, the draft
    /// stays selected and the callback is not invoked.
    pub async fn submit(&mut self) -> Result<UploadedObject, UploadError> {
        let Some(draft) = self.draft.as_mut() else {
            let message = "No file selected".to_string();
            self.error = Some(message.clone());
            return Err(UploadError::Validation(message));
        };

        draft.uploading = true;
        self.error = None;
        self.phase.send_replace(UploadPhase::Uploading);

        let result = self
            .gateway
            .upload(&draft.file, Some(&self.config.folder))
            .await;

        match result {
            Ok(uploaded) => {
                tracing::info!(
                    path = %uploaded.path,
                    folder = %self.config.folder,
                    "Upload complete"
                );
                if let Some(callback) = &self.on_upload_complete {
                    callback(&uploaded.public_url, &uploaded.path);
                }
                self.draft = None;
                self.phase.send_replace(UploadPhase::Empty);
                Ok(uploaded)
            }
            Err(e) => {
                tracing::warn!(folder = %self.config.folder, error = %e, "Upload failed");
                draft.uploading = false;
                self.error = Some(e.to_string());
                self.phase.send_replace(UploadPhase::Selected);
                Err(e.into())
            }
        }
    }

    /// Drop the draft and any error. Safe to call in any phase, any number of
    /// times.
    pub fn clear(&mut self) {
        self.draft = None;
        self.error = None;
        self.phase.send_if_modified(|phase| {
            let changed = *phase != UploadPhase::Empty;
            *phase = UploadPhase::Empty;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use titan_storage::MemoryStorage;

    struct Harness {
        storage: Arc<MemoryStorage>,
        calls: Arc<Mutex<Vec<(String, String)>>>,
        controller: UploadController,
    }

    fn harness(config: UploadConfig) -> Harness {
        let storage = Arc::new(MemoryStorage::new("https://cdn.example.com/media"));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let controller = UploadController::new(StorageGateway::new(storage.clone()), config)
            .on_upload_complete(move |url, path| {
                recorded
                    .lock()
                    .unwrap()
                    .push((url.to_string(), path.to_string()));
            });
        Harness {
            storage,
            calls,
            controller,
        }
    }

    fn png() -> LocalFile {
        LocalFile::new("logo.png", "image/png", b"\x89PNG".to_vec())
    }

    #[tokio::test]
    async fn select_builds_draft_without_network() {
        let mut h = harness(UploadConfig::default());
        h.controller.select(png()).await.unwrap();

        assert_eq!(h.controller.phase(), UploadPhase::Selected);
        let draft = h.controller.draft().unwrap();
        assert_eq!(draft.kind, MediaKind::Image);
        assert_eq!(draft.preview.data_url, "data:image/png;base64,iVBORw==");
        assert!(!draft.uploading);
        assert_eq!(h.storage.call_count(), 0);
    }

    #[tokio::test]
    async fn non_image_previews_as_video() {
        let mut h = harness(UploadConfig::default());
        h.controller
            .select(LocalFile::new("reel.mov", "video/quicktime", b"moov".to_vec()))
            .await
            .unwrap();
        assert_eq!(h.controller.draft().unwrap().kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn select_replaces_previous_draft() {
        let mut h = harness(UploadConfig::default());
        h.controller.select(png()).await.unwrap();
        h.controller
            .select(LocalFile::new("clip.mp4", "video/mp4", b"mp4".to_vec()))
            .await
            .unwrap();
        assert_eq!(h.controller.draft().unwrap().file.name, "clip.mp4");
    }

    #[tokio::test]
    async fn rejected_type_keeps_previous_draft() {
        let mut h = harness(UploadConfig::default());
        h.controller.select(png()).await.unwrap();

        let err = h
            .controller
            .select(LocalFile::new("notes.pdf", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(_)));
        assert!(h.controller.error().is_some());
        assert_eq!(h.controller.draft().unwrap().file.name, "logo.png");
        assert_eq!(h.controller.phase(), UploadPhase::Selected);
    }

    #[tokio::test]
    async fn successful_submit_reports_and_clears() {
        let mut h = harness(UploadConfig {
            folder: "logos".to_string(),
            ..UploadConfig::default()
        });
        h.controller.select(png()).await.unwrap();

        let uploaded = h.controller.submit().await.unwrap();
        assert!(uploaded.path.starts_with("logos/"));
        assert!(uploaded.path.ends_with(".png"));
        assert!(h.storage.contains(&uploaded.path));

        assert_eq!(h.controller.phase(), UploadPhase::Empty);
        assert!(h.controller.draft().is_none());
        assert!(h.controller.error().is_none());

        let calls = h.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(uploaded.public_url.clone(), uploaded.path.clone())]
        );
    }

    #[tokio::test]
    async fn failed_submit_retains_draft() {
        let mut h = harness(UploadConfig::default());
        h.controller.select(png()).await.unwrap();
        let before = h.controller.draft().cloned().unwrap();

        h.storage.fail_uploads(Some("quota exceeded".to_string()));
        let err = h.controller.submit().await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(h.controller.phase(), UploadPhase::Selected);
        assert_eq!(h.controller.draft(), Some(&before));
        assert!(h.controller.error().unwrap().contains("quota exceeded"));
        assert!(h.calls.lock().unwrap().is_empty());
        assert_eq!(h.storage.object_count(), 0);
    }

    #[tokio::test]
    async fn retry_after_failure_succeeds() {
        let mut h = harness(UploadConfig::default());
        h.controller.select(png()).await.unwrap();

        h.storage.fail_uploads(Some("network unreachable".to_string()));
        assert!(h.controller.submit().await.is_err());

        h.storage.fail_uploads(None);
        let uploaded = h.controller.submit().await.unwrap();
        assert!(uploaded.path.starts_with("general/"));
        assert_eq!(h.calls.lock().unwrap().len(), 1);
        assert_eq!(h.storage.call_count(), 2);
    }

    #[tokio::test]
    async fn submit_without_file_is_a_validation_error() {
        let mut h = harness(UploadConfig::default());
        let err = h.controller.submit().await.unwrap_err();
        assert!(matches!(err, UploadError::Validation(_)));
        assert_eq!(h.controller.phase(), UploadPhase::Empty);
        assert_eq!(h.storage.call_count(), 0);
    }

    #[tokio::test]
    async fn unconfigured_upload_fails_fast() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut controller =
            UploadController::new(StorageGateway::unconfigured(), UploadConfig::default())
                .on_upload_complete(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });

        controller.select(png()).await.unwrap();
        let err = controller.submit().await.unwrap_err();

        assert!(!err.is_retryable());
        assert!(controller.error().unwrap().contains("not configured"));
        assert_eq!(controller.phase(), UploadPhase::Selected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let mut h = harness(UploadConfig::default());
        h.controller.clear();
        assert_eq!(h.controller.phase(), UploadPhase::Empty);

        h.controller.select(png()).await.unwrap();
        h.controller.clear();
        h.controller.clear();
        assert_eq!(h.controller.phase(), UploadPhase::Empty);
        assert!(h.controller.draft().is_none());
        assert!(h.controller.error().is_none());
    }

    #[tokio::test]
    async fn phase_changes_are_published() {
        let mut h = harness(UploadConfig::default());
        let mut rx = h.controller.subscribe();

        h.controller.select(png()).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), UploadPhase::Selected);

        h.controller.submit().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), UploadPhase::Empty);
    }

    #[tokio::test]
    async fn select_path_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reel.webm");
        std::fs::write(&path, b"webm").unwrap();

        let mut h = harness(UploadConfig::default());
        h.controller.select_path(&path).await.unwrap();
        let draft = h.controller.draft().unwrap();
        assert_eq!(draft.file.content_type, "video/webm");
        assert_eq!(draft.kind, MediaKind::Video);

        let missing = h.controller.select_path(dir.path().join("missing.png")).await;
        assert!(matches!(missing, Err(UploadError::Validation(_))));
    }
}
