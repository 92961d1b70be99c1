use async_trait::async_trait;
use minio::s3::args::{BucketExistsArgs, MakeBucketArgs, PutObjectArgs, StatObjectArgs};
use minio::s3::client::{Client, ClientBuilder};
use minio::s3::creds::StaticProvider;
use minio::s3::http::BaseUrl;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use tracing::{debug, error, info, instrument, warn};

use crate::config::MinioConfig;

/// Contract the quote flow depends on: store bytes, hand back a link
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store bytes under their content-addressed key; returns the key
    async fn store(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Public download link for a stored object
    fn build_url(&self, object_name: &str) -> String;
}

/// Object storage for uploaded entry images and rendered documents. Keys are
/// content-addressed, so re-uploading identical bytes is a no-op.
#[derive(Debug, Clone)]
pub struct StorageService {
    client: Client,
    pub config: MinioConfig,
}

/// Derive the content-addressed key for an upload: sha256 of the bytes plus
/// the original file extension, lowercased.
pub fn object_key_for(data: &[u8], filename: &str) -> String {
    let digest = Sha256::digest(data);
    let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| *ext != filename && !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("uploads/{}{}", hash, extension)
}

impl StorageService {
    /// Create a new storage service instance
    #[instrument(skip(config), fields(endpoint = %config.endpoint, bucket = %config.bucket_name))]
    pub async fn new(config: MinioConfig) -> Result<Self, StorageError> {
        info!("Initializing object storage service");

        config.validate().map_err(|e| {
            error!("Storage configuration validation failed: {}", e);
            StorageError::ConfigError(e.to_string())
        })?;

        let base_url = config.get_endpoint_url().parse::<BaseUrl>().map_err(|e| {
            error!("Failed to parse storage endpoint URL: {}", e);
            StorageError::ConnectionError(format!("Invalid endpoint URL: {}", e))
        })?;

        let static_provider = StaticProvider::new(&config.access_key, &config.secret_key, None);

        let client = ClientBuilder::new(base_url)
            .provider(Some(Box::new(static_provider)))
            .build()
            .map_err(|e| {
                error!("Failed to create storage client: {}", e);
                StorageError::ConnectionError(format!("Client creation failed: {}", e))
            })?;

        let service = Self { client, config };
        service.ensure_bucket_exists().await?;

        info!("Object storage service initialized successfully");
        Ok(service)
    }

    /// Ensure the configured bucket exists, create if it doesn't
    #[instrument(skip(self))]
    async fn ensure_bucket_exists(&self) -> Result<(), StorageError> {
        let bucket_exists_args = BucketExistsArgs::new(&self.config.bucket_name)
            .map_err(|e| StorageError::InvalidArguments(e.to_string()))?;

        let exists = self
            .client
            .bucket_exists(&bucket_exists_args)
            .await
            .map_err(|e| {
                error!("Failed to check if bucket exists: {}", e);
                StorageError::OperationError(format!("Bucket exists check failed: {}", e))
            })?;

        if exists {
            return Ok(());
        }

        warn!("Bucket '{}' does not exist, creating it", self.config.bucket_name);

        let make_bucket_args = MakeBucketArgs::new(&self.config.bucket_name)
            .map_err(|e| StorageError::InvalidArguments(e.to_string()))?;

        self.client.make_bucket(&make_bucket_args).await.map_err(|e| {
            error!("Failed to create bucket '{}': {}", self.config.bucket_name, e);
            StorageError::OperationError(format!("Bucket creation failed: {}", e))
        })?;

        info!("Created bucket '{}'", self.config.bucket_name);
        Ok(())
    }

    /// Upload an object
    #[instrument(skip(self, data), fields(object_name = %object_name, size = data.len()))]
    pub async fn put_object(
        &self,
        object_name: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        info!(
            "Uploading object '{}' to bucket '{}'",
            object_name, self.config.bucket_name
        );

        // Clone what is needed for the blocking task
        let bucket_name = self.config.bucket_name.clone();
        let object_name_owned = object_name.to_string();
        let client = self.client.clone();
        let content_type_owned = content_type.map(|ct| ct.to_string());

        tokio::task::spawn_blocking(move || {
            let mut reader = Cursor::new(data);
            let data_len = reader.get_ref().len();

            // Keep the content_type String alive for the duration of args
            let ct_holder = content_type_owned;

            let mut args = PutObjectArgs::new(
                &bucket_name,
                &object_name_owned,
                &mut reader,
                Some(data_len),
                None,
            )
            .map_err(|e| StorageError::InvalidArguments(e.to_string()))?;

            if let Some(ref ct) = ct_holder {
                args.content_type = ct;
            }

            futures::executor::block_on(client.put_object(&mut args))
                .map_err(|e| StorageError::OperationError(format!("Upload failed: {}", e)))?;

            info!("Successfully uploaded object '{}'", &object_name_owned);
            Ok(())
        })
        .await
        .map_err(|e| {
            error!("Failed to join blocking task for put_object: {}", e);
            StorageError::OperationError(format!("Join error: {}", e))
        })??;
        Ok(())
    }

    /// Check whether an object already exists
    #[instrument(skip(self), fields(object_name = %object_name))]
    pub async fn object_exists(&self, object_name: &str) -> Result<bool, StorageError> {
        let args = StatObjectArgs::new(&self.config.bucket_name, object_name)
            .map_err(|e| StorageError::InvalidArguments(e.to_string()))?;

        match self.client.stat_object(&args).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

#[async_trait]
impl ObjectStorage for StorageService {
    /// Store uploaded bytes under their content-addressed key. When an object
    /// with the same hash already exists the upload is skipped and the
    /// existing key returned.
    #[instrument(skip(self, data), fields(filename = %filename, size = data.len()))]
    async fn store(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let object_name = object_key_for(&data, filename);

        if self.object_exists(&object_name).await? {
            debug!("Object '{}' already stored, skipping upload", object_name);
            return Ok(object_name);
        }

        self.put_object(&object_name, data, content_type).await?;
        Ok(object_name)
    }

    fn build_url(&self, object_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.links_prefix.trim_end_matches('/'),
            self.config.bucket_name,
            object_name
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Operation error: {0}")]
    OperationError(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_bytes_share_a_key() {
        let a = object_key_for(b"same bytes", "render.png");
        let b = object_key_for(b"same bytes", "copy-of-render.PNG");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_bytes_get_different_keys() {
        let a = object_key_for(b"one", "a.jpg");
        let b = object_key_for(b"two", "a.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_shape() {
        let key = object_key_for(b"bytes", "photo.jpeg");
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with(".jpeg"));
        // sha256 hex digest is 64 chars
        assert_eq!(key.len(), "uploads/".len() + 64 + ".jpeg".len());
    }

    #[test]
    fn test_extensionless_filename() {
        let key = object_key_for(b"bytes", "photo");
        assert!(!key.contains('.'));
    }
}
