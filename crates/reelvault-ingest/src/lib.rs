//! Reelvault Ingestion Library
//!
//! Content-addressed ingestion of uploaded videos. An upload is hashed while it
//! streams in, addressed by `{namespace}/{owner_id}/{sha256}.{ext}`, and written
//! to the object store only when no object exists under that key yet.
//!
//! The pipeline runs in two passes. The first pass hashes the incoming stream
//! and spools it to an anonymous temporary file, one chunk at a time. Once the
//! fingerprint (and therefore the key) is known, the dedup gate asks the store
//! whether the key exists. On a hit the spool is discarded and no remote write
//! happens; on a miss the spool is replayed into a write sink. Memory use is
//! bounded by the chunk size regardless of payload size.

pub mod dedup;
pub mod digest;
pub mod error;
pub mod key;
pub mod pipeline;
pub mod spool;

pub use dedup::DedupGate;
pub use digest::{ContentFingerprint, StreamingDigest};
pub use error::IngestError;
pub use key::{KeyBuilder, StorageKey};
pub use pipeline::{
    ByteStream, IngestState, IngestionPipeline, PipelineOptions, StagedUpload, UploadRequest,
};
pub use spool::Spool;
