#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-supabase")]
use crate::SupabaseStorage;
use crate::{MemoryStorage, StorageBackend, StorageGateway, StorageResult};
use std::sync::Arc;
use titan_core::StorageConfig;

/// Create the storage gateway from configuration
///
/// A backend without its credentials yields an unconfigured gateway rather
/// than an error, so pages can still render their empty states.
pub async fn create_gateway(config: &StorageConfig) -> StorageResult<StorageGateway> {
    if !config.is_configured() {
        tracing::warn!(
            backend = %config.backend,
            "Storage backend is not configured; media listings will be empty and uploads disabled"
        );
        return Ok(StorageGateway::unconfigured());
    }

    let gateway = match config.backend {
        #[cfg(feature = "storage-supabase")]
        StorageBackend::Supabase => {
            let (Some(url), Some(key)) = (&config.supabase_url, &config.supabase_key) else {
                return Ok(StorageGateway::unconfigured());
            };
            let storage = SupabaseStorage::new(
                url.clone(),
                key.clone(),
                config.bucket.clone(),
                std::time::Duration::from_secs(config.request_timeout_secs),
                config.cache_control_secs,
            )?;
            StorageGateway::new(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-supabase"))]
        StorageBackend::Supabase => {
            return Err(crate::StorageError::ConfigError(
                "Supabase storage backend not available (storage-supabase feature not enabled)"
                    .to_string(),
            ))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let (Some(path), Some(base_url)) =
                (&config.local_storage_path, &config.local_storage_base_url)
            else {
                return Ok(StorageGateway::unconfigured());
            };
            let storage = LocalStorage::new(path.clone(), base_url.clone()).await?;
            StorageGateway::new(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => {
            return Err(crate::StorageError::ConfigError(
                "Local storage backend not available (storage-local feature not enabled)"
                    .to_string(),
            ))
        }

        StorageBackend::Memory => StorageGateway::new(Arc::new(MemoryStorage::new(format!(
            "memory://{}",
            config.bucket
        )))),
    };

    tracing::info!(
        backend = ?gateway.backend_type(),
        bucket = %config.bucket,
        "Storage gateway ready"
    );
    Ok(gateway.with_list_limit(config.list_limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credentials_give_unconfigured_gateway() {
        let gateway = create_gateway(&StorageConfig::default()).await.unwrap();
        assert!(!gateway.is_configured());
        assert_eq!(gateway.backend_type(), None);
    }

    #[tokio::test]
    async fn memory_backend_from_config() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };

        let gateway = create_gateway(&config).await.unwrap();
        assert_eq!(gateway.backend_type(), Some(StorageBackend::Memory));
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn local_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            local_storage_path: Some(dir.path().to_string_lossy().into_owned()),
            local_storage_base_url: Some("http://localhost:8080/media".to_string()),
            ..StorageConfig::default()
        };

        let gateway = create_gateway(&config).await.unwrap();
        assert!(gateway.is_configured());
        assert_eq!(gateway.backend_type(), Some(StorageBackend::Local));
        assert_eq!(
            gateway.public_url_for("logos/a.png").unwrap(),
            "http://localhost:8080/media/logos/a.png"
        );
    }

    #[cfg(feature = "storage-supabase")]
    #[tokio::test]
    async fn supabase_backend_from_config() {
        let config = StorageConfig {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            supabase_key: Some("anon".to_string()),
            ..StorageConfig::default()
        };

        let gateway = create_gateway(&config).await.unwrap();
        assert_eq!(gateway.backend_type(), Some(StorageBackend::Supabase));
        assert_eq!(
            gateway.public_url_for("videos/reel.mp4").unwrap(),
            "https://abc.supabase.co/storage/v1/object/public/media/videos/reel.mp4"
        );
    }
}
