//! Route paths and multipart field names

/// Versioned upload route
pub const VIDEO_UPLOAD_PATH: &str = "/api/v0/videos";

/// Upload route kept for existing clients
pub const LEGACY_UPLOAD_PATH: &str = "/api/uploadVideo";

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

pub const HEALTH_PATH: &str = "/health";

/// Multipart field carrying the video bytes
pub const FILE_FIELD: &str = "file";

/// Multipart fields accepted for the owner identifier, in preference order
pub const OWNER_FIELDS: [&str; 2] = ["cedula", "owner_id"];

/// Allowance for multipart framing on top of the configured video size
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
