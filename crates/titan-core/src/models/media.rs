use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::MediaKind;
use crate::constants::LIST_PAGE_LIMIT;

/// Backend-reported metadata for a stored file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// One raw entry of a bucket listing, as returned by a storage backend.
///
/// Sub-folders are reported alongside files; they carry no `id` and no
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<ObjectMetadata>,
}

impl ObjectEntry {
    /// Whether this entry is a stored file rather than a sub-folder.
    pub fn is_file(&self) -> bool {
        self.id.is_some()
    }
}

/// Sort direction for the creation timestamp of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Options for a single-page listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: usize,
    pub offset: usize,
    pub created_order: SortOrder,
}

impl Default for ListOptions {
    /// First page, most recent first.
    fn default() -> Self {
        Self {
            limit: LIST_PAGE_LIMIT,
            offset: 0,
            created_order: SortOrder::Desc,
        }
    }
}

/// A stored file with its derived public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaObject {
    /// Last path segment of the key.
    pub name: String,
    /// Folder-qualified storage key, unique within the bucket.
    pub full_path: String,
    /// Derived from `full_path`; never stored on its own.
    pub public_url: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
}

impl MediaObject {
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_file_name(&self.name)
    }

    pub fn is_video(&self) -> bool {
        self.kind() == MediaKind::Video
    }

    /// Folder part of `full_path`, empty for objects at the bucket root.
    pub fn folder(&self) -> &str {
        match self.full_path.rsplit_once('/') {
            Some((folder, _)) => folder,
            None => "",
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedObject {
    pub path: String,
    pub public_url: String,
}

/// Human-readable size as shown in the admin listing.
pub fn format_file_size(bytes: Option<u64>) -> String {
    match bytes {
        None | Some(0) => "Unknown".to_string(),
        Some(bytes) => {
            let kb = bytes as f64 / 1024.0;
            if kb < 1024.0 {
                format!("{:.1} KB", kb)
            } else {
                format!("{:.1} MB", kb / 1024.0)
            }
        }
    }
}
