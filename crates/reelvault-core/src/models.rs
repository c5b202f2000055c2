//! Upload models returned by the ingestion pipeline and the HTTP layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Media classes accepted for ingestion.
///
/// Each class has a fixed storage extension; the client-supplied filename is
/// never used to pick the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Video,
}

impl MediaClass {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaClass::Video => "mp4",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaClass::Video => "video/mp4",
        }
    }
}

/// Whether an upload created a new object or found an identical one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Created,
    AlreadyExists,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResult {
    pub status: UploadStatus,
    /// Object URI, e.g. `gs://bucket/videos/{owner}/{sha256}.mp4`
    pub location: String,
    /// Storage key the content is addressed by
    pub key: String,
    /// Size of the uploaded payload in bytes
    pub size_bytes: u64,
}

impl UploadResult {
    pub fn is_created(&self) -> bool {
        self.status == UploadStatus::Created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_result_wire_shape() {
        let result = UploadResult {
            status: UploadStatus::AlreadyExists,
            location: "gs://bucket/videos/1/abc.mp4".to_string(),
            key: "videos/1/abc.mp4".to_string(),
            size_bytes: 3,
        };
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["status"], "already_exists");
        assert_eq!(json["location"], "gs://bucket/videos/1/abc.mp4");
        assert!(!result.is_created());
    }

    #[test]
    fn test_video_extension_is_fixed() {
        assert_eq!(MediaClass::Video.extension(), "mp4");
        assert_eq!(MediaClass::Video.content_type(), "video/mp4");
    }
}
