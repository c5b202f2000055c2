//! Configuration module
//!
//! The configuration is read from the environment once at process startup and
//! passed by reference to whatever needs it. Nothing in the workspace reads the
//! environment after `Config::from_env` returns.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_VIDEO_SIZE_MB: usize = 500;
const UPLOAD_TIMEOUT_SECS: u64 = 300;
const STREAM_CHUNK_SIZE_KB: usize = 64;
const WRITER_MAX_CONCURRENCY: usize = 8;
const KEY_NAMESPACE: &str = "videos";
const MEMORY_BUCKET_NAME: &str = "reelvault";

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub gcs_bucket: Option<String>,
    /// Service account key JSON. Never logged.
    pub gcs_service_account_json: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub memory_bucket: String,
    // Ingestion
    pub key_namespace: String,
    pub max_video_size_bytes: usize,
    pub upload_timeout_secs: u64,
    pub spool_dir: Option<String>,
    pub stream_chunk_size: usize,
    pub writer_max_concurrency: usize,
    // Logging
    pub log_format: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("cors_origins", &self.cors_origins)
            .field("storage_backend", &self.storage_backend)
            .field("gcs_bucket", &self.gcs_bucket)
            .field(
                "gcs_service_account_json",
                &self.gcs_service_account_json.as_ref().map(|_| "<redacted>"),
            )
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("local_storage_path", &self.local_storage_path)
            .field("key_namespace", &self.key_namespace)
            .field("max_video_size_bytes", &self.max_video_size_bytes)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Configuration backed by the in-memory object store, for local development and tests.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Config {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            storage_backend: StorageBackend::Memory,
            gcs_bucket: None,
            gcs_service_account_json: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            local_storage_base_url: None,
            memory_bucket: bucket.into(),
            key_namespace: KEY_NAMESPACE.to_string(),
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            upload_timeout_secs: UPLOAD_TIMEOUT_SECS,
            spool_dir: None,
            stream_chunk_size: STREAM_CHUNK_SIZE_KB * 1024,
            writer_max_concurrency: WRITER_MAX_CONCURRENCY,
            log_format: "compact".to_string(),
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Gcs,
        };

        let max_video_size_mb = parse_var("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB)?;
        let stream_chunk_size_kb = parse_var("STREAM_CHUNK_SIZE_KB", STREAM_CHUNK_SIZE_KB)?;

        let config = Config {
            server_port: parse_var("PORT", SERVER_PORT)?,
            environment,
            cors_origins,
            http_concurrency_limit: parse_var("HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT)?
                .max(1),
            storage_backend,
            gcs_bucket: env::var("GOOGLE_BUCKET_NAME").ok().filter(|s| !s.is_empty()),
            gcs_service_account_json: env::var("GOOGLE_SERVICE_ACCOUNT_JSON")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            memory_bucket: env::var("MEMORY_BUCKET_NAME")
                .unwrap_or_else(|_| MEMORY_BUCKET_NAME.to_string()),
            key_namespace: env::var("KEY_NAMESPACE")
                .unwrap_or_else(|_| KEY_NAMESPACE.to_string()),
            max_video_size_bytes: scale("MAX_VIDEO_SIZE_MB", max_video_size_mb, 1024 * 1024)?,
            upload_timeout_secs: parse_var("UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS)?,
            spool_dir: env::var("SPOOL_DIR").ok().filter(|s| !s.is_empty()),
            stream_chunk_size: scale("STREAM_CHUNK_SIZE_KB", stream_chunk_size_kb, 1024)?,
            writer_max_concurrency: parse_var("WRITER_MAX_CONCURRENCY", WRITER_MAX_CONCURRENCY)?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let namespace = self.key_namespace.as_str();
        if namespace.is_empty()
            || namespace.contains("..")
            || namespace.starts_with('/')
            || namespace.ends_with('/')
        {
            return Err(anyhow::anyhow!(
                "KEY_NAMESPACE must be a non-empty relative path without '..' or surrounding '/'"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than zero"));
        }
        if self.stream_chunk_size == 0 {
            return Err(anyhow::anyhow!("STREAM_CHUNK_SIZE_KB must be greater than zero"));
        }
        if self.writer_max_concurrency == 0 {
            return Err(anyhow::anyhow!("WRITER_MAX_CONCURRENCY must be greater than zero"));
        }
        if self.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_TIMEOUT_SECS must be greater than zero"));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::Gcs => {
                if self.gcs_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "GOOGLE_BUCKET_NAME must be set when using GCS storage backend"
                    ));
                }
                if let Some(ref json) = self.gcs_service_account_json {
                    serde_json::from_str::<serde_json::Value>(json).map_err(|_| {
                        anyhow::anyhow!("GOOGLE_SERVICE_ACCOUNT_JSON is not valid JSON")
                    })?;
                }
            }
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}

/// Read a numeric variable, falling back to `default` only when it is unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, anyhow::Error> {
    parse_value(name, env::var(name).ok(), default)
}

fn parse_value<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, anyhow::Error> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
    }
}

/// Convert a size in KiB/MiB units to bytes.
fn scale(name: &str, value: usize, unit: usize) -> Result<usize, anyhow::Error> {
    value
        .checked_mul(unit)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", name))
}
