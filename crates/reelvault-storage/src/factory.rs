#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{ObjectStoreStorage, Storage, StorageBackend, StorageError, StorageResult};
use reelvault_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.storage_backend {
        #[cfg(feature = "storage-gcs")]
        StorageBackend::Gcs => {
            let bucket = config.gcs_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("GOOGLE_BUCKET_NAME not configured".to_string())
            })?;
            let storage =
                ObjectStoreStorage::gcs(bucket, config.gcs_service_account_json.as_deref())?
                    .with_max_concurrency(config.writer_max_concurrency);
            Arc::new(storage)
        }

        #[cfg(not(feature = "storage-gcs"))]
        StorageBackend::Gcs => {
            return Err(StorageError::ConfigError(
                "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
            ))
        }

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let storage = ObjectStoreStorage::s3(bucket, region, config.s3_endpoint.clone())?
                .with_max_concurrency(config.writer_max_concurrency);
            Arc::new(storage)
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => {
            return Err(StorageError::ConfigError(
                "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
            ))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            Arc::new(LocalStorage::new(base_path, base_url).await?)
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => {
            return Err(StorageError::ConfigError(
                "Local storage backend not available (storage-local feature not enabled)"
                    .to_string(),
            ))
        }

        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; uploads are lost on restart");
            Arc::new(
                ObjectStoreStorage::in_memory(config.memory_bucket.clone())
                    .with_max_concurrency(config.writer_max_concurrency),
            )
        }
    };

    tracing::info!(backend = %storage.backend_type(), "Storage backend initialized");
    Ok(storage)
}
