//! Titan Media Library
//!
//! Client-side media components built on the storage gateway:
//!
//! - [`MediaGallery`]: one folder's listing as a load state machine that
//!   discards stale responses.
//! - [`LatestVideoResolver`]: the most recently created video across the
//!   candidate video folders.
//! - [`UploadController`]: select, preview and upload one file.
//! - [`MediaAdmin`]: the admin page flow tying the three together.

pub mod admin;
pub mod error;
pub mod gallery;
pub mod latest_video;
pub mod uploader;

pub use admin::{AdminItem, MediaAdmin};
pub use error::UploadError;
pub use gallery::{DisplayEntry, GalleryState, LoadOutcome, MediaGallery};
pub use latest_video::LatestVideoResolver;
pub use uploader::{
    generate_preview, Preview, UploadConfig, UploadController, UploadDraft, UploadPhase,
};
