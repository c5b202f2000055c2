use crate::traits::{Storage, StorageError, StorageResult, WriteSink};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::buffered::BufWriter;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, Attributes};
use object_store::ObjectStoreExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Storage implementation over any `object_store` backend
///
/// Writes go through `object_store::buffered::BufWriter`, which issues a single
/// PUT for small payloads and a multipart upload for large ones. Either way the
/// object only becomes visible when the upload completes.
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn object_store::ObjectStore>,
    bucket: String,
    backend: StorageBackend,
    max_concurrency: usize,
}

impl ObjectStoreStorage {
    pub fn new(
        store: Arc<dyn object_store::ObjectStore>,
        backend: StorageBackend,
        bucket: impl Into<String>,
    ) -> Self {
        ObjectStoreStorage {
            store,
            bucket: bucket.into(),
            backend,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Google Cloud Storage bucket.
    ///
    /// # Arguments
    /// * `bucket` - GCS bucket name
    /// * `service_account_json` - Optional service account key JSON. When absent the
    ///   builder falls back to `GOOGLE_SERVICE_ACCOUNT*` / application default credentials.
    #[cfg(feature = "storage-gcs")]
    pub fn gcs(bucket: String, service_account_json: Option<&str>) -> StorageResult<Self> {
        let mut builder = object_store::gcp::GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone());

        if let Some(json) = service_account_json {
            builder = builder.with_service_account_key(json);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), StorageBackend::Gcs, bucket))
    }

    /// S3 bucket, or an S3-compatible provider when `endpoint_url` is set
    /// (e.g. "http://localhost:9000" for MinIO).
    #[cfg(feature = "storage-s3")]
    pub fn s3(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = object_store::aws::AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), StorageBackend::S3, bucket))
    }

    /// Process-local store. Used for development and as the test fake.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), StorageBackend::Memory, bucket)
    }

    /// Bound on concurrently in-flight multipart parts per sink.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    fn location(storage_key: &str) -> StorageResult<Path> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(Path::from(storage_key))
    }
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Self::location(storage_key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "Object store existence check failed"
                );
                Err(StorageError::BackendError(e.to_string()))
            }
        }
    }

    async fn open_writer(
        &self,
        storage_key: &str,
        content_type: &str,
    ) -> StorageResult<Box<dyn WriteSink>> {
        let location = Self::location(storage_key)?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let writer = BufWriter::new(self.store.clone(), location)
            .with_max_concurrency(self.max_concurrency)
            .with_attributes(attributes);

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            max_concurrency = self.max_concurrency,
            "Opened object store writer"
        );

        Ok(Box::new(ObjectStoreSink {
            writer: Some(writer),
            bucket: self.bucket.clone(),
            key: storage_key.to_string(),
            written: 0,
            started: Instant::now(),
        }))
    }

    fn object_uri(&self, storage_key: &str) -> String {
        format!(
            "{}://{}/{}",
            self.backend.uri_scheme(),
            self.bucket,
            storage_key
        )
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let location = Self::location(storage_key)?;
        match self.store.head(&location).await {
            Ok(meta) => Ok(meta.size),
            Err(ObjectStoreError::NotFound { .. }) => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        let start = Instant::now();
        let location = Self::location(storage_key)?;

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store download successful"
        );

        Ok(bytes)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let location = Self::location(storage_key)?;
        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "Object store delete failed"
                );
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

/// Write sink over an `object_store` buffered writer.
///
/// `writer` is `None` once the sink has been closed or aborted.
struct ObjectStoreSink {
    writer: Option<BufWriter>,
    bucket: String,
    key: String,
    written: u64,
    started: Instant,
}

impl ObjectStoreSink {
    fn writer_mut(&mut self) -> StorageResult<&mut BufWriter> {
        self.writer
            .as_mut()
            .ok_or_else(|| StorageError::UploadFailed("write sink already finished".to_string()))
    }
}

#[async_trait]
impl WriteSink for ObjectStoreSink {
    async fn write(&mut self, chunk: Bytes) -> StorageResult<()> {
        let len = chunk.len() as u64;
        let writer = self.writer_mut()?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        self.written += len;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> StorageResult<u64> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| StorageError::UploadFailed("write sink already finished".to_string()))?;

        if let Err(e) = writer.shutdown().await {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %self.key,
                size_bytes = self.written,
                duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
                "Object store upload failed"
            );
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(error = %abort_err, key = %self.key, "Failed to abort object store upload");
            }
            return Err(StorageError::UploadFailed(e.to_string()));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %self.key,
            size_bytes = self.written,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Object store upload successful"
        );

        Ok(self.written)
    }

    async fn abort(mut self: Box<Self>) -> StorageResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .abort()
                .await
                .map_err(|e| StorageError::BackendError(e.to_string()))?;
            tracing::debug!(key = %self.key, size_bytes = self.written, "Object store upload aborted");
        }
        Ok(())
    }
}

impl Drop for ObjectStoreSink {
    fn drop(&mut self) {
        // Dropped without close/abort: the caller was cancelled or bailed out.
        if let Some(mut writer) = self.writer.take() {
            let key = std::mem::take(&mut self.key);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = writer.abort().await {
                        tracing::warn!(error = %e, key = %key, "Failed to abort dropped upload");
                    }
                });
            }
        }
    }
}
