use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;

/// Anonymous temporary file holding one upload between hashing and writing.
///
/// The file has no name on disk, so the OS reclaims it as soon as the handle
/// is dropped, including when the owning request is cancelled.
pub struct Spool {
    file: File,
    len: u64,
}

impl Spool {
    /// Create a spool in `dir`, or in the system temp directory.
    pub fn create(dir: Option<&Path>) -> io::Result<Self> {
        let file = match dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        Ok(Spool {
            file: File::from_std(file),
            len: 0,
        })
    }

    pub async fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rewind and replay the spooled bytes in chunks of at most `chunk_size`.
    pub async fn into_chunks(mut self, chunk_size: usize) -> io::Result<ReaderStream<File>> {
        self.file.flush().await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(ReaderStream::with_capacity(self.file, chunk_size.max(1)))
    }
}
