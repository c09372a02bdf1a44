//! Data models shared by the storage gateway and the media components.

mod file;
mod kind;
mod media;

pub use file::*;
pub use kind::*;
pub use media::*;
