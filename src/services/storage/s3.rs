//! S3 storage backend.
//!
//! Supports both AWS S3 and MinIO for development. The `data:` URI is
//! decoded back to raw bytes and stored under `uploads/{uuid}` with the
//! embedded media type as the object's content type.
//!
//! Objects are served straight from the bucket unless `S3_PUBLIC_URL` points
//! elsewhere, so the bucket gets an anonymous read policy on `uploads/*`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::S3Settings;
use crate::error::{AppError, AppResult};
use crate::services::data_uri::DataUri;

use super::{StorageProvider, StoredObject};

const KEY_PREFIX: &str = "uploads";

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: String,
    serve_from_bucket: bool,
}

impl S3Storage {
    /// Create a new S3 storage client from configuration.
    pub async fn new(config: &S3Settings) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            config.secret_key.expose_secret(),
            None,
            None,
            "qrshare",
        );

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        // Use custom endpoint for MinIO in development
        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        let storage = Self {
            client,
            bucket: config.bucket.clone(),
            public_base: Self::public_base(config),
            serve_from_bucket: config.public_url.is_none(),
        };

        storage.ensure_bucket_exists().await?;
        if storage.serve_from_bucket {
            storage.allow_public_reads().await?;
        }

        info!(
            "S3 storage initialized: bucket={}, public_base={}",
            storage.bucket, storage.public_base
        );

        Ok(storage)
    }

    /// Origin that stored objects are publicly served from.
    ///
    /// An explicit `S3_PUBLIC_URL` wins; otherwise path-style on the custom
    /// endpoint, or the regional virtual-hosted AWS URL.
    pub fn public_base(config: &S3Settings) -> String {
        if let Some(ref public_url) = config.public_url {
            return public_url.trim_end_matches('/').to_string();
        }

        match config.endpoint {
            Some(ref endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket, config.region
            ),
        }
    }

    /// Build a fresh object key for an upload.
    pub fn object_key(id: Uuid) -> String {
        format!("{}/{}", KEY_PREFIX, id)
    }

    /// Bucket policy granting anonymous `GetObject` on uploaded objects only.
    pub fn public_read_policy(bucket: &str) -> String {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicReadUploads",
                "Effect": "Allow",
                "Principal": { "AWS": ["*"] },
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/{}/*", bucket, KEY_PREFIX)],
            }]
        })
        .to_string()
    }

    async fn allow_public_reads(&self) -> AppResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(Self::public_read_policy(&self.bucket))
            .send()
            .await
            .map_err(|e| {
                AppError::StorageUpload(format!(
                    "Failed to make '{}/{}' publicly readable (set S3_PUBLIC_URL if objects are served elsewhere): {}",
                    self.bucket,
                    KEY_PREFIX,
                    e.into_service_error()
                ))
            })?;

        info!("S3 bucket '{}' serves {}/* publicly", self.bucket, KEY_PREFIX);
        Ok(())
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("S3 bucket '{}' exists", self.bucket);
                Ok(())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::StorageUpload(format!("Failed to create bucket: {}", e))
                        })?;
                    info!("S3 bucket '{}' created", self.bucket);
                    Ok(())
                } else {
                    Err(AppError::StorageUpload(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl StorageProvider for S3Storage {
    async fn upload(&self, content: &DataUri) -> AppResult<StoredObject> {
        let decoded = content.decode()?;
        let key = Self::object_key(Uuid::new_v4());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(decoded.media_type)
            .body(aws_sdk_s3::primitives::ByteStream::from(decoded.bytes))
            .send()
            .await
            .map_err(|e| AppError::StorageUpload(format!("Failed to upload file to S3: {}", e)))?;

        Ok(StoredObject {
            public_url: format!("{}/{}", self.public_base, key),
            storage_id: key,
            resource_type: None,
        })
    }

    async fn delete(&self, object: &StoredObject) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object.storage_id)
            .send()
            .await
            .map_err(|e| {
                AppError::StorageUpload(format!(
                    "Failed to delete S3 object {}: {}",
                    object.storage_id, e
                ))
            })?;

        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "s3"
    }
}
