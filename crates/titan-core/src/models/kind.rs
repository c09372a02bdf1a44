use serde::{Deserialize, Serialize};

use crate::constants::VIDEO_EXTENSIONS;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".avif", ".bmp", ".ico",
];

/// Kind of a media file, derived from its MIME type or file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Classify a declared MIME type.
    pub fn from_mime(content_type: &str) -> Self {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            MediaKind::Image
        } else if content_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// Classify a file name by its extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            MediaKind::Video
        } else if IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            MediaKind::Image
        } else {
            MediaKind::Other
        }
    }

    /// Kind used to render an upload preview: `image/*` previews as an image,
    /// anything else that passed the accept filter as a video.
    pub fn for_preview(content_type: &str) -> Self {
        match Self::from_mime(content_type) {
            MediaKind::Image => MediaKind::Image,
            _ => MediaKind::Video,
        }
    }
}

/// Whether a file matches an `accept` pattern list such as `"image/*,video/*"`.
///
/// Patterns are comma separated and may be a wildcard MIME type (`image/*`),
/// an exact MIME type (`video/mp4`) or an extension (`.png`). An empty pattern
/// list accepts everything.
pub fn accepts(accept: &str, content_type: &str, file_name: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    let file_name = file_name.to_ascii_lowercase();
    let mut patterns = accept
        .split(',')
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty())
        .peekable();

    if patterns.peek().is_none() {
        return true;
    }

    patterns.any(|pattern| {
        if pattern.starts_with('.') {
            file_name.ends_with(&pattern)
        } else if let Some(prefix) = pattern.strip_suffix("/*") {
            content_type
                .split_once('/')
                .is_some_and(|(top, _)| top == prefix)
        } else {
            content_type == pattern
        }
    })
}

/// Best-effort MIME type from a file extension, used when reading files from disk.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}
