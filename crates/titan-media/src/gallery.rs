//! Folder gallery state machine.
//!
//! `Idle -> Loading -> Ready | Failed`. Every load is a full reload and
//! replaces the previous state wholesale. Each load takes a generation number;
//! a response whose generation is no longer the latest is dropped, so a slow
//! listing for a folder the user already left cannot overwrite a newer one.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use titan_core::MediaObject;
use titan_storage::{StorageGateway, StorageResult};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryState {
    Idle,
    Loading { folder: String },
    Ready { folder: String, items: Vec<MediaObject> },
    Failed { folder: String, error: String },
}

impl GalleryState {
    pub fn folder(&self) -> Option<&str> {
        match self {
            GalleryState::Idle => None,
            GalleryState::Loading { folder }
            | GalleryState::Ready { folder, .. }
            | GalleryState::Failed { folder, .. } => Some(folder),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GalleryState::Loading { .. })
    }

    /// Items of a `Ready` state, empty otherwise.
    pub fn items(&self) -> &[MediaObject] {
        match self {
            GalleryState::Ready { items, .. } => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GalleryState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Whether a finished load was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Stale,
}

/// One slot rendered by a gallery consumer such as the logo marquee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    /// Empty for placeholders.
    pub src: String,
    pub alt: String,
}

pub struct MediaGallery {
    gateway: StorageGateway,
    generation: AtomicU64,
    state: watch::Sender<GalleryState>,
}

impl MediaGallery {
    pub fn new(gateway: StorageGateway) -> Self {
        let (state, _) = watch::channel(GalleryState::Idle);
        Self {
            gateway,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<GalleryState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GalleryState {
        self.state.borrow().clone()
    }

    /// Folder of the most recent load, if any.
    pub fn folder(&self) -> Option<String> {
        self.state.borrow().folder().map(String::from)
    }

    /// Load `folder`, replacing whatever is displayed.
    pub async fn load(&self, folder: &str) -> LoadOutcome {
        // Generation bump and `Loading` publish share the channel lock.
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = GalleryState::Loading {
                folder: folder.to_string(),
            };
        });

        tracing::debug!(folder = %folder, generation, "Loading gallery");

        let next = match self.gateway.list(folder).await {
            Ok(items) => GalleryState::Ready {
                folder: folder.to_string(),
                items,
            },
            Err(e) => {
                tracing::error!(folder = %folder, error = %e, "Failed to load media");
                GalleryState::Failed {
                    folder: folder.to_string(),
                    error: e.to_string(),
                }
            }
        };

        // The generation check runs under the channel's write lock so a newer
        // load either bumped the counter already or will publish after us.
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        });

        if applied {
            LoadOutcome::Applied
        } else {
            tracing::debug!(folder = %folder, generation, "Discarding stale gallery response");
            LoadOutcome::Stale
        }
    }

    /// Reload the current folder. Does nothing before the first load.
    pub async fn reload(&self) -> Option<LoadOutcome> {
        let folder = self.folder()?;
        Some(self.load(&folder).await)
    }

    /// Delete an object and, once the backend confirms, drop it from the
    /// displayed items. Nothing changes locally when the delete fails.
    pub async fn remove(&self, path: &str) -> StorageResult<()> {
        self.gateway.remove(path).await?;

        self.state.send_if_modified(|state| match state {
            GalleryState::Ready { items, .. } => {
                let before = items.len();
                items.retain(|item| item.full_path != path);
                items.len() != before
            }
            _ => false,
        });
        Ok(())
    }

    /// Entries to render: the loaded objects, or `fallback_count` placeholders
    /// labelled `Logo N` while nothing is available.
    pub fn display_entries(&self, fallback_count: usize) -> Vec<DisplayEntry> {
        let state = self.state.borrow();
        let items = state.items();
        if items.is_empty() {
            (1..=fallback_count)
                .map(|i| DisplayEntry {
                    src: String::new(),
                    alt: format!("Logo {}", i),
                })
                .collect()
        } else {
            items
                .iter()
                .map(|item| DisplayEntry {
                    src: item.public_url.clone(),
                    alt: item.name.clone(),
                })
                .collect()
        }
    }
}
