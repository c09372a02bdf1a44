use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use titan_core::{ListOptions, ObjectEntry};

/// Storage backed by the Supabase Storage REST API (or any server exposing
/// the same object endpoints).
#[derive(Clone, Debug)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
    cache_control_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    sort_by: SortBy,
}

#[derive(Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

/// Error body returned by the storage API, e.g.
/// `{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}`.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    status_code: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

impl SupabaseStorage {
    /// Create a new SupabaseStorage instance
    ///
    /// # Arguments
    /// * `base_url` - Project URL (e.g., "https://abc.supabase.co")
    /// * `api_key` - Access key sent as `apikey` and bearer token
    /// * `bucket` - Bucket name
    pub fn new(
        base_url: String,
        api_key: String,
        bucket: String,
        timeout: Duration,
        cache_control_secs: u64,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            bucket,
            cache_control_secs,
        })
    }

    fn encode_key(key: &str) -> String {
        key.split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            Self::encode_key(key)
        )
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Map a non-success response to a storage error.
    async fn error_from_response(
        response: reqwest::Response,
        key: &str,
        fallback: fn(String) -> StorageError,
    ) -> StorageError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();

        // The API sometimes answers 400 with the real status in the body.
        let effective = body
            .status_code
            .as_deref()
            .and_then(|code| code.parse::<u16>().ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(status);

        let message = body
            .message
            .or(body.error)
            .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text });

        match effective {
            StatusCode::CONFLICT => StorageError::AlreadyExists(key.to_string()),
            StatusCode::NOT_FOUND => StorageError::NotFound(format!("{}: {}", key, message)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StorageError::PermissionDenied(message)
            }
            _ => fallback(format!("status {}: {}", effective, message)),
        }
    }
}

fn transport_error(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::BackendError(format!("Request timed out: {}", e))
    } else {
        StorageError::BackendError(format!("Request failed: {}", e))
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<Vec<ObjectEntry>> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let body = ListRequest {
            prefix,
            limit: options.limit,
            offset: options.offset,
            sort_by: SortBy {
                column: "created_at",
                order: options.created_order.as_str(),
            },
        };

        let start = std::time::Instant::now();
        let response = self
            .apply_auth(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response, prefix, StorageError::ListFailed).await;
            tracing::error!(
                error = %err,
                bucket = %self.bucket,
                prefix = %prefix,
                "Supabase storage list failed"
            );
            return Err(err);
        }

        let entries: Vec<ObjectEntry> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                StorageError::ListFailed(format!("Failed to parse listing response: {}", e))
            }
        })?;

        tracing::info!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = entries.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage list successful"
        );

        Ok(entries)
    }

    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let request = self
            .client
            .post(self.object_url(storage_key))
            .header("Content-Type", content_type)
            .header("Cache-Control", format!("max-age={}", self.cache_control_secs))
            .header("x-upsert", "false")
            .body(data);
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err =
                Self::error_from_response(response, storage_key, StorageError::UploadFailed).await;
            tracing::error!(
                error = %err,
                bucket = %self.bucket,
                key = %storage_key,
                "Supabase storage upload failed"
            );
            return Err(err);
        }

        // "Key" is bucket-qualified ("media/general/x.png"); fall back to the
        // requested key when it is absent.
        let stored_key = response
            .json::<UploadResponse>()
            .await
            .ok()
            .and_then(|body| body.key)
            .and_then(|key| {
                key.strip_prefix(&format!("{}/", self.bucket))
                    .map(String::from)
            })
            .unwrap_or_else(|| storage_key.to_string());

        tracing::info!(
            bucket = %self.bucket,
            key = %stored_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage upload successful"
        );

        Ok(stored_key)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let start = std::time::Instant::now();

        let request = self.client.delete(&url).json(&RemoveRequest {
            prefixes: [storage_key],
        });
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err =
                Self::error_from_response(response, storage_key, StorageError::DeleteFailed).await;
            tracing::error!(
                error = %err,
                bucket = %self.bucket,
                key = %storage_key,
                "Supabase storage delete failed"
            );
            return Err(err);
        }

        // The API answers with the removed objects; nothing removed means the
        // key did not exist.
        let text = response.text().await.map_err(transport_error)?;
        let removed: Vec<serde_json::Value> = serde_json::from_str(&text).map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to parse delete response: {}", e))
        })?;
        if removed.is_empty() {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage delete successful"
        );

        Ok(())
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            Self::encode_key(storage_key)
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}
