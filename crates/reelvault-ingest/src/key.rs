use crate::digest::ContentFingerprint;
use crate::error::IngestError;
use reelvault_core::MediaClass;
use std::fmt;

pub const DEFAULT_NAMESPACE: &str = "videos";
pub const MAX_OWNER_ID_LEN: usize = 128;

/// Object-store key of the form `{namespace}/{owner_id}/{fingerprint}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives storage keys. Pure: no I/O.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    namespace: String,
}

impl Default for KeyBuilder {
    fn default() -> Self {
        KeyBuilder {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl KeyBuilder {
    /// `namespace` is trusted configuration, already checked by `Config::validate`.
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        KeyBuilder {
            namespace: namespace.trim_matches('/').to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reject owner ids that are unsafe inside a key. Never normalizes.
    pub fn validate_owner_id(&self, owner_id: &str) -> Result<(), IngestError> {
        if owner_id.is_empty() {
            return Err(IngestError::MissingOwnerId);
        }
        if owner_id.trim().is_empty() {
            return Err(IngestError::MissingOwnerId);
        }
        if owner_id.contains("..") {
            return Err(IngestError::InvalidOwnerId(
                "must not contain '..'".to_string(),
            ));
        }
        if owner_id.starts_with('/') {
            return Err(IngestError::InvalidOwnerId(
                "must not start with '/'".to_string(),
            ));
        }
        if owner_id == "." {
            return Err(IngestError::InvalidOwnerId(
                "must not be a relative path segment".to_string(),
            ));
        }
        if owner_id.chars().count() > MAX_OWNER_ID_LEN {
            return Err(IngestError::InvalidOwnerId(format!(
                "must be at most {} characters",
                MAX_OWNER_ID_LEN
            )));
        }
        if let Some(c) = owner_id.chars().find(|c| !is_allowed_owner_char(*c)) {
            let reason = if c == '/' || c == '\\' {
                "must not contain path separators".to_string()
            } else if c.is_whitespace() || c.is_control() {
                "must not contain whitespace or control characters".to_string()
            } else {
                format!("contains disallowed character {:?}", c)
            };
            return Err(IngestError::InvalidOwnerId(reason));
        }
        Ok(())
    }

    pub fn build(
        &self,
        owner_id: &str,
        fingerprint: &ContentFingerprint,
        media_class: MediaClass,
    ) -> Result<StorageKey, IngestError> {
        self.validate_owner_id(owner_id)?;
        Ok(StorageKey(format!(
            "{}/{}/{}.{}",
            self.namespace,
            owner_id,
            fingerprint,
            media_class.extension()
        )))
    }
}

fn is_allowed_owner_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp() -> ContentFingerprint {
        ContentFingerprint::of(&[0x00, 0x01, 0x02])
    }

    #[test]
    fn test_build_key() {
        let key = KeyBuilder::default()
            .build("12345678", &fp(), MediaClass::Video)
            .unwrap();
        assert_eq!(
            key.as_str(),
            "videos/12345678/ae4b3280e56e2faf83f414a6e3dabe9d5fbe18976544c05fed121accb85b53fc.mp4"
        );
    }

    #[test]
    fn test_custom_namespace_trims_slashes() {
        let builder = KeyBuilder::new("/tenant-a/videos/");
        assert_eq!(builder.namespace(), "tenant-a/videos");
        let key = builder.build("42", &fp(), MediaClass::Video).unwrap();
        assert!(key.as_str().starts_with("tenant-a/videos/42/"));
    }

    #[test]
    fn test_different_owners_different_keys() {
        let builder = KeyBuilder::default();
        let a = builder.build("111", &fp(), MediaClass::Video).unwrap();
        let b = builder.build("222", &fp(), MediaClass::Video).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_owner() {
        let builder = KeyBuilder::default();
        assert!(matches!(builder.validate_owner_id(""), Err(IngestError::MissingOwnerId)));
        assert!(matches!(builder.validate_owner_id("   "), Err(IngestError::MissingOwnerId)));
    }

    #[test]
    fn test_unsafe_owners_rejected() {
        let builder = KeyBuilder::default();
        for owner in [
            "../etc",
            "..",
            "a..b",
            "/root",
            "a/b",
            "a\\b",
            "12 34",
            " 1234",
            "12\n34",
            "12\u{0}34",
            ".",
            "ñandú",
            "id%2F",
        ] {
            assert!(
                matches!(builder.validate_owner_id(owner), Err(IngestError::InvalidOwnerId(_))),
                "owner {:?} should be rejected",
                owner
            );
        }
    }

    #[test]
    fn test_owner_length_limit() {
        let builder = KeyBuilder::default();
        assert!(builder.validate_owner_id(&"9".repeat(MAX_OWNER_ID_LEN)).is_ok());
        assert!(builder
            .validate_owner_id(&"9".repeat(MAX_OWNER_ID_LEN + 1))
            .is_err());
    }

    #[test]
    fn test_safe_owners_accepted() {
        let builder = KeyBuilder::default();
        for owner in ["12345678", "V-12.345.678", "owner_1", "a.b"] {
            assert!(builder.validate_owner_id(owner).is_ok(), "{:?}", owner);
        }
    }
}
