use crate::error::IngestError;
use crate::key::StorageKey;
use reelvault_storage::Storage;
use std::sync::Arc;

/// Existence check in front of every write.
///
/// The store is the only source of truth; nothing is cached in process.
///
/// Two concurrent uploads of identical content for the same owner may both
/// observe "absent" and both write. They write the same bytes to the same key,
/// so the final object is identical either way: an accepted idempotent
/// overwrite, with no lock taken.
#[derive(Clone)]
pub struct DedupGate {
    storage: Arc<dyn Storage>,
}

impl DedupGate {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        DedupGate { storage }
    }

    pub async fn check_exists(&self, key: &StorageKey) -> Result<bool, IngestError> {
        let exists = self
            .storage
            .exists(key.as_str())
            .await
            .map_err(|source| IngestError::StorageExistsCheck {
                key: key.to_string(),
                source,
            })?;

        tracing::debug!(key = %key, exists, "Dedup check completed");
        Ok(exists)
    }
}
