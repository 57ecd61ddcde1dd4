//! Database queries for upload records.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use crate::entity::upload_record::{ActiveModel, Entity as UploadRecordEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewUploadRecord, UploadRecord};

use super::{DbPool, RecordStore};

impl DbPool {
    /// Insert a new upload record.
    pub async fn insert_upload_record(&self, record: NewUploadRecord) -> AppResult<UploadRecord> {
        let model = ActiveModel {
            id: Set(record.id),
            original_name: Set(record.original_name),
            storage_url: Set(record.storage_url),
            storage_object_id: Set(record.storage_object_id),
            code_image: Set(record.code_image),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to insert upload record: {}", e)))?;

        Ok(result.into())
    }

    /// Get an upload record by ID.
    pub async fn get_upload_record(&self, id: Uuid) -> AppResult<Option<UploadRecord>> {
        let result = UploadRecordEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to get upload record: {}", e)))?;

        Ok(result.map(UploadRecord::from))
    }

    /// Count all upload records.
    pub async fn count_upload_records(&self) -> AppResult<u64> {
        let count = UploadRecordEntity::find()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to count upload records: {}", e)))?;

        Ok(count)
    }
}

#[async_trait]
impl RecordStore for DbPool {
    fn allocate_id(&self) -> Uuid {
        // UUIDv7 keeps ids time-ordered
        Uuid::now_v7()
    }

    async fn create(&self, record: NewUploadRecord) -> AppResult<UploadRecord> {
        self.insert_upload_record(record).await
    }

    async fn get_by_id(&self, id: &str) -> AppResult<UploadRecord> {
        let id = Uuid::parse_str(id).map_err(|e| {
            AppError::Persistence(format!("Invalid record identifier '{}': {}", id, e))
        })?;

        self.get_upload_record(id)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(format!("File {}", id)))
    }
}
