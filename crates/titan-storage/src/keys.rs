//! Shared key generation for storage backends.
//!
//! Key format: `{folder}/{millis}-{token}.{ext}`, or `{millis}-{token}.{ext}` at
//! the bucket root.

use crate::{StorageError, StorageResult};
use chrono::Utc;
use rand::Rng;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 6;

/// Normalize a folder name: surrounding slashes are dropped, nesting and
/// traversal are rejected. An empty folder is the bucket root.
pub fn normalize_folder(folder: &str) -> StorageResult<String> {
    let folder = folder.trim().trim_matches('/');
    if folder.contains('/') || folder.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Folder must be a single path segment: {}",
            folder
        )));
    }
    if folder == "." || folder == ".." {
        return Err(StorageError::InvalidKey(format!("Invalid folder: {}", folder)));
    }
    Ok(folder.to_string())
}

/// Validate a full storage key before handing it to a backend.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.starts_with('/')
        || storage_key.ends_with('/')
        || storage_key.contains('\\')
        || storage_key.split('/').any(|segment| segment.is_empty() || segment == "..")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Join a folder and an entry name into a folder-qualified key.
pub fn full_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Generate a collision-avoiding key for a new upload.
///
/// The millisecond timestamp orders keys by upload time, the random token
/// separates uploads landing in the same millisecond, and the original
/// extension is kept (alphanumerics only).
pub fn generate_object_key(folder: &str, extension: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let token: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();

    let extension: Option<String> = extension
        .map(|ext| ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>())
        .filter(|ext| !ext.is_empty());

    let file_name = match extension {
        Some(ext) => format!("{}-{}.{}", millis, token, ext),
        None => format!("{}-{}", millis, token),
    };
    full_path(folder, &file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn folders_are_single_segments() {
        assert_eq!(normalize_folder("logos").unwrap(), "logos");
        assert_eq!(normalize_folder("/logos/").unwrap(), "logos");
        assert_eq!(normalize_folder("").unwrap(), "");
        assert!(matches!(
            normalize_folder("logos/2024"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(normalize_folder("..").is_err());
        assert!(normalize_folder("a\\b").is_err());
    }

    #[test]
    fn keys_reject_traversal() {
        assert!(validate_key("general/a.png").is_ok());
        assert!(validate_key("a.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("general/../secret").is_err());
        assert!(validate_key("general//a.png").is_err());
        assert!(validate_key("general/").is_err());
    }

    #[test]
    fn generated_key_layout() {
        let key = generate_object_key("general", Some("png"));
        let (folder, name) = key.split_once('/').unwrap();
        assert_eq!(folder, "general");
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        let (millis, token) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 1_600_000_000_000);
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
    }

    #[test]
    fn generated_key_without_extension_or_folder() {
        let key = generate_object_key("", None);
        assert!(!key.contains('/'));
        assert!(!key.contains('.'));

        let key = generate_object_key("general", Some("../"));
        assert!(!key.ends_with('.'));
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn rapid_keys_do_not_collide() {
        let keys: HashSet<String> = (0..500)
            .map(|_| generate_object_key("general", Some("png")))
            .collect();
        assert_eq!(keys.len(), 500);
    }
}
