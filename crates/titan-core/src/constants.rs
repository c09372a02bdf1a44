//! Shared constants for storage layout and media defaults.

/// Name of the bucket holding every media object.
pub const MEDIA_BUCKET: &str = "media";

/// Destination folder for uploads when the caller does not pick one.
pub const DEFAULT_UPLOAD_FOLDER: &str = "general";

/// Folder rendered by gallery consumers (the logos marquee) by default.
pub const DEFAULT_GALLERY_FOLDER: &str = "logos";

/// File-picker restriction used by the upload controller by default.
pub const DEFAULT_ACCEPT: &str = "image/*,video/*";

/// Number of entries requested from the backend for one listing page.
pub const LIST_PAGE_LIMIT: usize = 100;

/// Placeholder slots rendered by the gallery when a folder is empty.
pub const DEFAULT_FALLBACK_COUNT: usize = 10;

/// `Cache-Control` max-age applied to uploaded objects.
pub const UPLOAD_CACHE_CONTROL_SECS: u64 = 3600;

/// Extensions recognized as video files (compared case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".avi"];

/// Folders scanned when looking for the most recent video. Both spellings exist
/// in deployed buckets.
pub const VIDEO_FOLDER_CANDIDATES: &[&str] = &["Videos", "videos"];

/// Folders offered by the admin surface, as `(id, display name)`.
pub const ADMIN_FOLDERS: &[(&str, &str)] = &[
    ("screenshots", "Screenshots"),
    ("logos", "Logos"),
    ("videos", "Videos"),
    ("general", "General"),
];
