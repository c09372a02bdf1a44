//! Media admin flow: pick a folder, browse it, upload into it, delete from it.

use crate::error::UploadError;
use crate::gallery::{LoadOutcome, MediaGallery};
use crate::uploader::{UploadConfig, UploadController};
use serde::Serialize;
use titan_core::constants::ADMIN_FOLDERS;
use titan_core::{format_file_size, MediaObject, UploadedObject};
use titan_storage::{StorageGateway, StorageResult};

const INITIAL_FOLDER: &str = "screenshots";

/// One row of the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminItem {
    pub name: String,
    pub full_path: String,
    pub public_url: String,
    pub size: String,
    pub is_video: bool,
}

impl From<&MediaObject> for AdminItem {
    fn from(object: &MediaObject) -> Self {
        Self {
            name: object.name.clone(),
            full_path: object.full_path.clone(),
            public_url: object.public_url.clone(),
            size: format_file_size(object.size_bytes),
            is_video: object.is_video(),
        }
    }
}

pub struct MediaAdmin {
    gallery: MediaGallery,
    uploader: UploadController,
    folder: String,
}

impl MediaAdmin {
    pub fn new(gateway: StorageGateway) -> Self {
        let uploader = UploadController::new(
            gateway.clone(),
            UploadConfig {
                folder: INITIAL_FOLDER.to_string(),
                ..UploadConfig::default()
            },
        );
        Self {
            gallery: MediaGallery::new(gateway),
            uploader,
            folder: INITIAL_FOLDER.to_string(),
        }
    }

    /// Folders offered for browsing and uploading, as `(id, display name)`.
    pub fn folders() -> &'static [(&'static str, &'static str)] {
        ADMIN_FOLDERS
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn gallery(&self) -> &MediaGallery {
        &self.gallery
    }

    pub fn uploader(&self) -> &UploadController {
        &self.uploader
    }

    pub fn uploader_mut(&mut self) -> &mut UploadController {
        &mut self.uploader
    }

    /// Switch folder: uploads go there and the gallery reloads it.
    pub async fn select_folder(&mut self, folder: &str) -> LoadOutcome {
        self.folder = folder.to_string();
        self.uploader.set_folder(folder);
        self.gallery.load(folder).await
    }

    /// Submit the selected file and refresh the listing once it is stored.
    pub async fn upload(&mut self) -> Result<UploadedObject, UploadError> {
        let uploaded = self.uploader.submit().await?;
        self.gallery.load(&self.folder).await;
        Ok(uploaded)
    }

    /// Delete an object; the listing drops it only after the backend confirms.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        self.gallery.remove(path).await
    }

    pub fn items(&self) -> Vec<AdminItem> {
        self.gallery
            .state()
            .items()
            .iter()
            .map(AdminItem::from)
            .collect()
    }
}
