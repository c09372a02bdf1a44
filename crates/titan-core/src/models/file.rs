use bytes::Bytes;

use super::kind::{guess_content_type, MediaKind};

/// A file chosen on the client side, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Original file name, used for the stored extension.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Build a file whose MIME type is guessed from its name.
    pub fn with_guessed_type(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).to_string();
        Self::new(name, content_type, data)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Extension of the original name without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.content_type)
    }
}
