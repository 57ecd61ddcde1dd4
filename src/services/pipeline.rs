//! Upload and download orchestration.
//!
//! An upload moves through `Received → Buffered → Encoded → Stored →
//! Recorded → Completed`, strictly in order. A failure at any stage aborts
//! the rest. Once the object exists on the storage host, a later failure
//! deletes it again so no orphan is left behind; if that delete also fails
//! the orphan is logged with enough detail to clean it up by hand.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::RecordStore;
use crate::error::{AppError, AppResult};
use crate::models::{NewUploadRecord, UploadRecord};
use crate::services::data_uri::DataUri;
use crate::services::intake::IntakeFile;
use crate::services::qr_code::QrCodeGenerator;
use crate::services::storage::{StorageProvider, StoredObject};

/// Progress of one upload through the pipeline.
///
/// `Received` is logged by the HTTP handler before buffering; the rest are
/// logged here. Variants are declared in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStage {
    Received,
    Buffered,
    Encoded,
    Stored,
    Recorded,
    Completed,
    Failed,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Buffered => "buffered",
            Self::Encoded => "encoded",
            Self::Stored => "stored",
            Self::Recorded => "recorded",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinates storage, QR generation and record persistence.
#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn RecordStore>,
    storage: Arc<dyn StorageProvider>,
    codes: QrCodeGenerator,
    public_base_url: String,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        storage: Arc<dyn StorageProvider>,
        codes: QrCodeGenerator,
        public_base_url: impl Into<String>,
    ) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            store,
            storage,
            codes,
            public_base_url,
        }
    }

    /// Backend-mediated retrieval link for a record.
    pub fn download_url(&self, id: Uuid) -> String {
        format!("{}/api/download/{}", self.public_base_url, id)
    }

    /// Run the full upload sequence for a buffered file.
    pub async fn upload(&self, file: IntakeFile) -> AppResult<UploadRecord> {
        debug!(
            stage = %UploadStage::Buffered,
            "Upload buffered: filename={}, bytes={}, media_type={}",
            file.original_name,
            file.len(),
            file.media_type
        );

        let content = DataUri::encode(&file.media_type, &file.bytes);
        debug!(stage = %UploadStage::Encoded, "Upload encoded: filename={}", file.original_name);

        let object = self
            .storage
            .upload(&content)
            .await
            .map_err(|e| Self::failed(UploadStage::Encoded, &file.original_name, e))?;
        debug!(
            stage = %UploadStage::Stored,
            "Upload stored: filename={}, storage_id={}",
            file.original_name,
            object.storage_id
        );

        let record = match self.record(&file, &object).await {
            Ok(record) => record,
            Err(e) => {
                let e = Self::failed(UploadStage::Stored, &file.original_name, e);
                self.compensate(&object).await;
                return Err(e);
            }
        };
        debug!(stage = %UploadStage::Recorded, "Upload recorded: id={}", record.id);

        info!(
            stage = %UploadStage::Completed,
            "File uploaded: id={}, filename={}, storage={}, storage_id={}",
            record.id,
            record.original_name,
            self.storage.storage_type(),
            record.storage_object_id
        );

        Ok(record)
    }

    /// Resolve a record identifier to the URL its content lives at.
    pub async fn resolve_download(&self, id: &str) -> AppResult<String> {
        let record = self.store.get_by_id(id).await?;
        debug!("Resolved download: id={}, url={}", record.id, record.storage_url);
        Ok(record.storage_url)
    }

    /// Mint the id, render its QR code and persist the record.
    async fn record(&self, file: &IntakeFile, object: &StoredObject) -> AppResult<UploadRecord> {
        let id = self.store.allocate_id();
        let code_image = self.codes.encode(&self.download_url(id))?;

        self.store
            .create(NewUploadRecord {
                id,
                original_name: file.original_name.clone(),
                storage_url: object.public_url.clone(),
                storage_object_id: object.storage_id.clone(),
                code_image,
            })
            .await
    }

    /// Delete an object whose record could not be written.
    async fn compensate(&self, object: &StoredObject) {
        warn!(
            "Deleting orphaned object {} from {}",
            object.storage_id,
            self.storage.storage_type()
        );

        if let Err(e) = self.storage.delete(object).await {
            error!(
                storage_id = %object.storage_id,
                public_url = %object.public_url,
                "Orphaned object left on {}: {}",
                self.storage.storage_type(),
                e
            );
        }
    }

    fn failed(last_stage: UploadStage, filename: &str, err: AppError) -> AppError {
        warn!(
            stage = %UploadStage::Failed,
            last_stage = %last_stage,
            "Upload failed after stage {}: filename={}, error={}",
            last_stage,
            filename,
            err
        );
        err
    }
}
