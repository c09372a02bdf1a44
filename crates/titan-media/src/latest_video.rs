use futures::future::join_all;
use titan_core::constants::VIDEO_FOLDER_CANDIDATES;
use titan_core::{MediaKind, MediaObject};
use titan_storage::StorageGateway;

/// Finds the most recently created video across a set of candidate folders.
///
/// A folder that fails to list contributes nothing; the others are still
/// scanned. Finding no video is not an error.
#[derive(Clone)]
pub struct LatestVideoResolver {
    gateway: StorageGateway,
    folders: Vec<String>,
}

impl LatestVideoResolver {
    /// Resolver over the default candidates (`Videos`, `videos`).
    pub fn new(gateway: StorageGateway) -> Self {
        Self::with_folders(gateway, VIDEO_FOLDER_CANDIDATES.iter().copied())
    }

    pub fn with_folders<I, S>(gateway: StorageGateway, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            gateway,
            folders: folders.into_iter().map(Into::into).collect(),
        }
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Every video found, most recent first.
    ///
    /// Folders are listed concurrently but their results are merged in
    /// candidate order, and the sort is stable, so equal timestamps resolve the
    /// same way for the same listings.
    pub async fn candidates(&self) -> Vec<MediaObject> {
        let listings = join_all(self.folders.iter().map(|folder| async move {
            match self.gateway.list(folder).await {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!(folder = %folder, error = %e, "Skipping video folder");
                    Vec::new()
                }
            }
        }))
        .await;

        let mut videos: Vec<MediaObject> = listings
            .into_iter()
            .flatten()
            .filter(|file| MediaKind::from_file_name(&file.name) == MediaKind::Video)
            .collect();

        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::debug!(
            folders = ?self.folders,
            count = videos.len(),
            "Collected video candidates"
        );
        videos
    }

    /// The most recent video, or `None` when no folder holds one.
    pub async fn resolve(&self) -> Option<MediaObject> {
        let latest = self.candidates().await.into_iter().next();
        match &latest {
            Some(video) => {
                tracing::info!(path = %video.full_path, created_at = %video.created_at, "Latest video selected")
            }
            None => tracing::info!(folders = ?self.folders, "No video available"),
        }
        latest
    }

    /// Public URL of the most recent video.
    pub async fn latest_video_url(&self) -> Option<String> {
        self.resolve().await.map(|video| video.public_url)
    }
}
