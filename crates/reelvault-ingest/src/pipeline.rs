use crate::dedup::DedupGate;
use crate::digest::{ContentFingerprint, StreamingDigest};
use crate::error::IngestError;
use crate::key::{KeyBuilder, StorageKey};
use crate::spool::Spool;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reelvault_core::{Config, MediaClass, UploadResult, UploadStatus};
use reelvault_storage::{Storage, WriteSink};
use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Boxed upload body, readable exactly once.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_payload_bytes: u64,
    /// Replay chunk size when writing the spool through to storage
    pub chunk_size: usize,
    /// Directory for spool files; system temp dir when `None`
    pub spool_dir: Option<PathBuf>,
    pub media_class: MediaClass,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            spool_dir: None,
            media_class: MediaClass::Video,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        PipelineOptions {
            max_payload_bytes: config.max_video_size_bytes as u64,
            chunk_size: config.stream_chunk_size,
            spool_dir: config.spool_dir.as_ref().map(PathBuf::from),
            media_class: MediaClass::Video,
        }
    }
}

/// An owner id plus the body to ingest for it.
pub struct UploadRequest {
    owner_id: String,
    content: ByteStream,
}

impl UploadRequest {
    /// A missing stream is reported before a missing owner.
    pub fn new(owner_id: Option<String>, content: Option<ByteStream>) -> Result<Self, IngestError> {
        let content = content.ok_or(IngestError::MissingFile)?;
        let owner_id = owner_id
            .filter(|o| !o.is_empty())
            .ok_or(IngestError::MissingOwnerId)?;
        Ok(UploadRequest { owner_id, content })
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of one upload, reported through `tracing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestState {
    ReceivingStream,
    Hashing,
    Deduping,
    ShortCircuited,
    Writing,
    Completed,
    Failed(String),
}

/// Tracks the current state and logs every transition.
#[derive(Debug)]
struct Progress {
    state: IngestState,
    started: Instant,
}

impl Progress {
    fn new() -> Self {
        tracing::debug!(state = ?IngestState::ReceivingStream, "Ingest started");
        Progress {
            state: IngestState::ReceivingStream,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: IngestState) {
        tracing::debug!(from = ?self.state, to = ?next, "Ingest state transition");
        self.state = next;
    }

    fn fail(&mut self, err: IngestError) -> IngestError {
        let duration_ms = self.elapsed_ms();
        if err.is_validation() {
            tracing::debug!(from = ?self.state, kind = err.kind(), error = %err, duration_ms, "Ingest rejected");
        } else {
            tracing::warn!(from = ?self.state, kind = err.kind(), error = %err, duration_ms, "Ingest failed");
        }
        self.state = IngestState::Failed(err.kind().to_string());
        err
    }

    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

/// Result of the first pass: the fingerprint and a local copy of the body.
/// Nothing has touched the object store yet.
pub struct StagedUpload {
    fingerprint: ContentFingerprint,
    spool: Spool,
    size_bytes: u64,
    progress: Progress,
}

impl StagedUpload {
    pub fn fingerprint(&self) -> &ContentFingerprint {
        &self.fingerprint
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn state(&self) -> &IngestState {
        &self.progress.state
    }
}

/// Hash, dedup and conditionally write uploads to the injected store.
#[derive(Clone)]
pub struct IngestionPipeline {
    storage: Arc<dyn Storage>,
    gate: DedupGate,
    keys: KeyBuilder,
    options: PipelineOptions,
}

impl IngestionPipeline {
    pub fn new(storage: Arc<dyn Storage>, keys: KeyBuilder, options: PipelineOptions) -> Self {
        IngestionPipeline {
            gate: DedupGate::new(storage.clone()),
            storage,
            keys,
            options,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(
            storage,
            KeyBuilder::new(config.key_namespace.clone()),
            PipelineOptions::from_config(config),
        )
    }

    pub fn key_builder(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Ingest one upload end to end. The owner id is validated before the
    /// body is read.
    pub async fn submit_upload(&self, request: UploadRequest) -> Result<UploadResult, IngestError> {
        let UploadRequest { owner_id, content } = request;
        self.keys.validate_owner_id(&owner_id)?;

        let staged = self.stage(content).await?;
        self.commit(&owner_id, staged).await
    }

    /// First pass: hash the stream while spooling it locally.
    pub async fn stage<S, E>(&self, stream: S) -> Result<StagedUpload, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: fmt::Display,
    {
        let mut progress = Progress::new();
        let max_bytes = self.options.max_payload_bytes;

        let mut spool = Spool::create(self.options.spool_dir.as_deref())
            .map_err(|e| progress.fail(IngestError::Spool(e)))?;
        let mut digest = StreamingDigest::new();
        progress.advance(IngestState::Hashing);

        let mut stream = std::pin::pin!(stream);
        while let Some(next) = stream.next().await {
            let chunk = next.map_err(|e| {
                progress.fail(IngestError::StreamRead {
                    bytes_read: digest.bytes_consumed(),
                    message: e.to_string(),
                })
            })?;

            if digest.bytes_consumed() + chunk.len() as u64 > max_bytes {
                return Err(progress.fail(IngestError::PayloadTooLarge { max_bytes }));
            }

            digest.update(&chunk);
            spool
                .append(&chunk)
                .await
                .map_err(|e| progress.fail(IngestError::Spool(e)))?;
        }

        let size_bytes = digest.bytes_consumed();
        let fingerprint = digest.finalize();

        tracing::debug!(
            fingerprint = %fingerprint.short(),
            size_bytes,
            duration_ms = progress.elapsed_ms(),
            "Upload staged"
        );

        Ok(StagedUpload {
            fingerprint,
            spool,
            size_bytes,
            progress,
        })
    }

    /// Second pass: derive the key, consult the gate, write on a miss.
    pub async fn commit(
        &self,
        owner_id: &str,
        staged: StagedUpload,
    ) -> Result<UploadResult, IngestError> {
        let StagedUpload {
            fingerprint,
            spool,
            size_bytes,
            mut progress,
        } = staged;

        let key = self
            .keys
            .build(owner_id, &fingerprint, self.options.media_class)
            .map_err(|e| progress.fail(e))?;
        let location = self.storage.object_uri(key.as_str());

        progress.advance(IngestState::Deduping);
        let exists = self
            .gate
            .check_exists(&key)
            .await
            .map_err(|e| progress.fail(e))?;

        if exists {
            progress.advance(IngestState::ShortCircuited);
            drop(spool);
            progress.advance(IngestState::Completed);

            tracing::info!(
                fingerprint = %fingerprint.short(),
                size_bytes,
                status = "already_exists",
                duration_ms = progress.elapsed_ms(),
                "Upload already stored, write skipped"
            );

            return Ok(UploadResult {
                status: UploadStatus::AlreadyExists,
                location,
                key: key.into_string(),
                size_bytes,
            });
        }

        progress.advance(IngestState::Writing);
        let written = self
            .write_through(&key, spool)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance(IngestState::Completed);

        tracing::info!(
            fingerprint = %fingerprint.short(),
            size_bytes = written,
            status = "created",
            duration_ms = progress.elapsed_ms(),
            "Upload stored"
        );

        Ok(UploadResult {
            status: UploadStatus::Created,
            location,
            key: key.into_string(),
            size_bytes: written,
        })
    }

    /// Replay the spool into a fresh sink. Every failure path aborts the sink,
    /// so nothing becomes visible under `key` unless `close` succeeds.
    async fn write_through(&self, key: &StorageKey, spool: Spool) -> Result<u64, IngestError> {
        let mut chunks = spool.into_chunks(self.options.chunk_size).await?;

        let mut sink = self
            .storage
            .open_writer(key.as_str(), self.options.media_class.content_type())
            .await
            .map_err(|source| IngestError::StorageWrite {
                key: key.to_string(),
                source,
            })?;

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    abort_sink(sink, key).await;
                    return Err(IngestError::Spool(e));
                }
            };

            if let Err(source) = sink.write(chunk).await {
                abort_sink(sink, key).await;
                return Err(IngestError::StorageWrite {
                    key: key.to_string(),
                    source,
                });
            }
        }

        sink.close()
            .await
            .map_err(|source| IngestError::StorageWrite {
                key: key.to_string(),
                source,
            })
    }
}

async fn abort_sink(sink: Box<dyn WriteSink>, key: &StorageKey) {
    if let Err(e) = sink.abort().await {
        tracing::warn!(key = %key, error = %e, "Failed to abort write sink");
    }
}
