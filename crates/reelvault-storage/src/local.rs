use crate::traits::{Storage, StorageError, StorageResult, WriteSink};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Sinks write to a hidden `.partial` file next to the destination and rename
/// it into place on close, so the final path appears atomically.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/reelvault")
    /// * `base_url` - Base URL used for object locations (e.g., "file:///var/lib/reelvault")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys containing path traversal sequences that could escape the
    /// base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);
        if !path.starts_with(&self.base_path) {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Hidden sibling path used while an object is being written.
    fn partial_path(path: &Path) -> PathBuf {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.partial", file_name, Uuid::new_v4()))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// The filesystem keeps no content type; it is ignored.
    async fn open_writer(
        &self,
        storage_key: &str,
        _content_type: &str,
    ) -> StorageResult<Box<dyn WriteSink>> {
        let final_path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&final_path).await?;

        let partial_path = Self::partial_path(&final_path);
        let file = fs::File::create(&partial_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                partial_path.display(),
                e
            ))
        })?;

        Ok(Box::new(LocalSink {
            file: Some(file),
            partial_path,
            final_path,
            key: storage_key.to_string(),
            written: 0,
            started: Instant::now(),
        }))
    }

    fn object_uri(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), key = %storage_key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Write sink over a hidden partial file; `file` is `None` once finished.
struct LocalSink {
    file: Option<fs::File>,
    partial_path: PathBuf,
    final_path: PathBuf,
    key: String,
    written: u64,
    started: Instant,
}

#[async_trait]
impl WriteSink for LocalSink {
    async fn write(&mut self, chunk: Bytes) -> StorageResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StorageError::UploadFailed("write sink already finished".to_string()))?;
        file.write_all(&chunk).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                self.partial_path.display(),
                e
            ))
        })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> StorageResult<u64> {
        let file = self
            .file
            .take()
            .ok_or_else(|| StorageError::UploadFailed("write sink already finished".to_string()))?;

        let finish = async {
            let mut file = file;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&self.partial_path, &self.final_path).await
        };

        if let Err(e) = finish.await {
            let _ = fs::remove_file(&self.partial_path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to finalize file {}: {}",
                self.final_path.display(),
                e
            )));
        }

        tracing::info!(
            path = %self.final_path.display(),
            key = %self.key,
            size_bytes = self.written,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.written)
    }

    async fn abort(mut self: Box<Self>) -> StorageResult<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            match fs::remove_file(&self.partial_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::IoError(e)),
            }
        }
        Ok(())
    }
}

impl Drop for LocalSink {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.partial_path);
        }
    }
}
