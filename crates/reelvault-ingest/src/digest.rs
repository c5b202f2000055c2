use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Incremental SHA-256 over an upload, fed chunk by chunk in stream order.
///
/// State is constant in the payload size. `finalize` consumes the digest, so a
/// fingerprint can only be produced once.
#[derive(Clone, Default)]
pub struct StreamingDigest {
    hasher: Sha256,
    bytes: u64,
}

impl StreamingDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.bytes
    }

    pub fn finalize(self) -> ContentFingerprint {
        ContentFingerprint(hex::encode(self.hasher.finalize()))
    }
}

/// Lowercase hex SHA-256 of a complete payload (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

#[derive(Debug, thiserror::Error)]
#[error("not a 64-character hex SHA-256 digest")]
pub struct InvalidFingerprint;

impl ContentFingerprint {
    pub const HEX_LEN: usize = 64;

    /// Fingerprint of an in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        let mut digest = StreamingDigest::new();
        digest.update(data);
        digest.finalize()
    }

    /// Accept an existing hex digest; uppercase input is lowercased.
    pub fn parse(value: &str) -> Result<Self, InvalidFingerprint> {
        if value.len() != Self::HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidFingerprint);
        }
        Ok(ContentFingerprint(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading 12 characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl FromStr for ContentFingerprint {
    type Err = InvalidFingerprint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
