//! Remote object storage for uploaded files.
//!
//! Providers receive the file as a `data:` URI and return a public URL plus
//! the host's own identifier for the object. Uploads are not idempotent and
//! are never retried here.

pub mod cloudinary;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StorageSettings;
use crate::error::AppResult;
use crate::services::data_uri::DataUri;

pub use cloudinary::CloudinaryStorage;
pub use s3::S3Storage;

/// An object created on the storage host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Publicly retrievable URL of the content
    pub public_url: String,
    /// Host-side identifier, needed to manage or delete the object later
    pub storage_id: String,
    /// Host-specific object class (Cloudinary `image`/`video`/`raw`)
    pub resource_type: Option<String>,
}

/// Storage provider trait
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Create a durable, publicly addressable object from the encoded content.
    async fn upload(&self, content: &DataUri) -> AppResult<StoredObject>;

    /// Delete a previously uploaded object.
    async fn delete(&self, object: &StoredObject) -> AppResult<()>;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;
}

/// Build the provider selected by configuration.
pub async fn build_provider(settings: &StorageSettings) -> AppResult<Arc<dyn StorageProvider>> {
    let provider: Arc<dyn StorageProvider> = match settings {
        StorageSettings::Cloudinary(cloudinary) => Arc::new(CloudinaryStorage::new(cloudinary)?),
        StorageSettings::S3(s3) => Arc::new(S3Storage::new(s3).await?),
    };
    Ok(provider)
}
