//! Upload record domain model and API response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::upload_record;

/// A stored file and the QR code pointing at it.
///
/// Field names on the wire follow the contract the upload form already reads
/// (`filename`, `cloudinaryUrl`, `qrCode`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadRecord {
    pub id: Uuid,
    /// File name as declared by the client.
    #[serde(rename = "filename")]
    pub original_name: String,
    /// Public URL of the stored content.
    #[serde(rename = "cloudinaryUrl")]
    pub storage_url: String,
    /// Storage host's identifier for the content.
    #[serde(rename = "cloudinaryPublicId")]
    pub storage_object_id: String,
    /// PNG QR code as a `data:` URI.
    #[serde(rename = "qrCode")]
    pub code_image: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<upload_record::Model> for UploadRecord {
    fn from(model: upload_record::Model) -> Self {
        Self {
            id: model.id,
            original_name: model.original_name,
            storage_url: model.storage_url,
            storage_object_id: model.storage_object_id,
            code_image: model.code_image,
            created_at: model.created_at,
        }
    }
}

/// Fields supplied when persisting a new record.
#[derive(Debug, Clone)]
pub struct NewUploadRecord {
    /// Identifier minted by the record store before the QR code is rendered.
    pub id: Uuid,
    pub original_name: String,
    pub storage_url: String,
    pub storage_object_id: String,
    pub code_image: String,
}

/// Successful upload response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file: UploadRecord,
}

impl UploadResponse {
    pub fn new(file: UploadRecord) -> Self {
        Self {
            success: true,
            message: "File uploaded successfully.".to_string(),
            file,
        }
    }
}
