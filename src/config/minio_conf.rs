use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
    pub links_prefix: String,
    pub region: Option<String>,
    pub secure: bool,
}

impl MinioConfig {
    /// Load MinIO configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MINIO_ENDPOINT: MinIO server endpoint (e.g., "localhost:9000")
    /// - MINIO_ACCESS_KEY: Access key for MinIO
    /// - MINIO_SECRET_KEY: Secret key for MinIO
    /// - MINIO_BUCKET_NAME: Default bucket name
    /// - MINIO_LINKS_PREFIX: Public base URL used to build download links
    /// - MINIO_REGION: Optional region (defaults to "us-east-1")
    /// - MINIO_SECURE: Whether to use HTTPS (defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MinIO configuration from environment variables");

        let endpoint = env::var("MINIO_ENDPOINT").map_err(|_| {
            error!("MINIO_ENDPOINT environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_ENDPOINT".to_string())
        })?;
        debug!("MinIO endpoint: {}", endpoint);

        let access_key = env::var("MINIO_ACCESS_KEY").map_err(|_| {
            error!("MINIO_ACCESS_KEY environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_ACCESS_KEY".to_string())
        })?;

        let secret_key = env::var("MINIO_SECRET_KEY").map_err(|_| {
            error!("MINIO_SECRET_KEY environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_SECRET_KEY".to_string())
        })?;

        let bucket_name = env::var("MINIO_BUCKET_NAME").map_err(|_| {
            error!("MINIO_BUCKET_NAME environment variable not found");
            ConfigError::EnvVarNotFound("MINIO_BUCKET_NAME".to_string())
        })?;
        debug!("MinIO bucket name: {}", bucket_name);

        let region = env::var("MINIO_REGION").ok().or_else(|| {
            warn!("MINIO_REGION not set, using default: us-east-1");
            Some("us-east-1".to_string())
        });

        let secure = env::var("MINIO_SECURE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or_else(|_| {
                warn!("Invalid MINIO_SECURE value, defaulting to false");
                false
            });

        let links_prefix = env::var("MINIO_LINKS_PREFIX").unwrap_or_else(|_| {
            warn!("MINIO_LINKS_PREFIX not set, using default: http://127.0.0.1:9000");
            "http://127.0.0.1:9000".to_string()
        });

        let config = Self {
            endpoint,
            access_key,
            secret_key,
            bucket_name,
            links_prefix,
            region,
            secure,
        };

        info!("MinIO configuration loaded successfully");
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            error!("MinIO endpoint is empty");
            return Err(ConfigError::InvalidValue(
                "Endpoint cannot be empty".to_string(),
            ));
        }
        if self.access_key.is_empty() {
            error!("MinIO access key is empty");
            return Err(ConfigError::InvalidValue(
                "Access key cannot be empty".to_string(),
            ));
        }
        if self.secret_key.is_empty() {
            error!("MinIO secret key is empty");
            return Err(ConfigError::InvalidValue(
                "Secret key cannot be empty".to_string(),
            ));
        }
        if !self
            .bucket_name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
        {
            error!("Invalid bucket name format: {}", self.bucket_name);
            return Err(ConfigError::InvalidValue(
                "Bucket name contains invalid characters".to_string(),
            ));
        }
        if self.bucket_name.len() < 3 || self.bucket_name.len() > 63 {
            error!("Invalid bucket name length: {}", self.bucket_name.len());
            return Err(ConfigError::InvalidValue(
                "Bucket name must be between 3 and 63 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the full endpoint URL with protocol
    pub fn get_endpoint_url(&self) -> String {
        let protocol = if self.secure { "https" } else { "http" };
        format!("{}://{}", protocol, self.endpoint)
    }
}

impl Default for MinioConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket_name: "renders-uploads".to_string(),
            links_prefix: "http://127.0.0.1:9000".to_string(),
            region: Some("us-east-1".to_string()),
            secure: false,
        }
    }
}
