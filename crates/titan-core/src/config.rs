//! Configuration module
//!
//! Storage configuration is read once at startup and shared by reference. A
//! missing endpoint or access key is not an error: it leaves the storage
//! gateway unconfigured so reads degrade to empty listings.

use std::env;

use crate::constants::{LIST_PAGE_LIMIT, MEDIA_BUCKET, UPLOAD_CACHE_CONTROL_SECS};
use crate::storage_types::StorageBackend;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Storage configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub bucket: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub list_limit: usize,
    pub request_timeout_secs: u64,
    pub cache_control_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Supabase,
            supabase_url: None,
            supabase_key: None,
            bucket: MEDIA_BUCKET.to_string(),
            local_storage_path: None,
            local_storage_base_url: None,
            list_limit: LIST_PAGE_LIMIT,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            cache_control_secs: UPLOAD_CACHE_CONTROL_SECS,
        }
    }
}

impl StorageConfig {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Supabase,
        };

        let config = StorageConfig {
            backend,
            supabase_url: var("SUPABASE_URL").or_else(|| var("VITE_SUPABASE_URL")),
            supabase_key: var("SUPABASE_ANON_KEY").or_else(|| var("VITE_SUPABASE_ANON_KEY")),
            bucket: var("MEDIA_BUCKET").unwrap_or_else(|| MEDIA_BUCKET.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            list_limit: var("STORAGE_LIST_LIMIT")
                .map(|v| {
                    v.parse()
                        .map_err(|_| anyhow::anyhow!("STORAGE_LIST_LIMIT must be a valid number"))
                })
                .transpose()?
                .unwrap_or(LIST_PAGE_LIMIT),
            request_timeout_secs: var("STORAGE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            cache_control_secs: var("UPLOAD_CACHE_CONTROL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(UPLOAD_CACHE_CONTROL_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.bucket.is_empty() || self.bucket.contains('/') {
            return Err(anyhow::anyhow!(
                "MEDIA_BUCKET must be a non-empty name without '/'"
            ));
        }
        if self.list_limit == 0 {
            return Err(anyhow::anyhow!("STORAGE_LIST_LIMIT must be greater than 0"));
        }
        if let Some(url) = &self.supabase_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "SUPABASE_URL must start with http:// or https://"
                ));
            }
        }
        Ok(())
    }

    /// Whether the selected backend has everything it needs. When this is
    /// false the gateway runs in degraded mode.
    pub fn is_configured(&self) -> bool {
        match self.backend {
            StorageBackend::Supabase => self.supabase_url.is_some() && self.supabase_key.is_some(),
            StorageBackend::Local => {
                self.local_storage_path.is_some() && self.local_storage_base_url.is_some()
            }
            StorageBackend::Memory => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorageConfig, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorageConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_is_unconfigured() {
        let config = load(&[]).unwrap();
        assert_eq!(config.backend, StorageBackend::Supabase);
        assert_eq!(config.bucket, "media");
        assert_eq!(config.list_limit, 100);
        assert!(!config.is_configured());
    }

    #[test]
    fn supabase_credentials_configure_the_backend() {
        let config = load(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert!(config.is_configured());
    }

    #[test]
    fn web_client_variable_names_are_accepted() {
        let config = load(&[
            ("VITE_SUPABASE_URL", "https://abc.supabase.co"),
            ("VITE_SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(config.supabase_url.as_deref(), Some("https://abc.supabase.co"));
        assert!(config.is_configured());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = load(&[("SUPABASE_URL", "https://abc.supabase.co"), ("SUPABASE_ANON_KEY", "  ")])
            .unwrap();
        assert!(!config.is_configured());
    }

    #[test]
    fn local_backend_needs_path_and_base_url() {
        let config = load(&[("STORAGE_BACKEND", "local"), ("LOCAL_STORAGE_PATH", "/tmp/media")])
            .unwrap();
        assert!(!config.is_configured());

        let config = load(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/media"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8080"),
        ])
        .unwrap();
        assert!(config.is_configured());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("STORAGE_BACKEND", "ftp")]).is_err());
        assert!(load(&[("STORAGE_LIST_LIMIT", "many")]).is_err());
        assert!(load(&[("STORAGE_LIST_LIMIT", "0")]).is_err());
        assert!(load(&[("SUPABASE_URL", "abc.supabase.co")]).is_err());
        assert!(load(&[("MEDIA_BUCKET", "a/b")]).is_err());
    }
}
