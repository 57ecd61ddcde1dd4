//! Transient intake of a single uploaded file.
//!
//! Reads the `file` part of a `multipart/form-data` body fully into memory
//! before any remote call is made. Nothing downstream runs unless a file
//! was actually received.

use actix_multipart::{Field, Multipart};
use actix_web::{HttpMessage, HttpRequest};
use futures_util::StreamExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::data_uri::{DEFAULT_MEDIA_TYPE, media_type_for_filename};

/// Form field the upload form sends its file under.
pub const FILE_FIELD: &str = "file";

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// A fully buffered upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeFile {
    /// Client-declared file name, informational only
    pub original_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl IntakeFile {
    pub fn new(original_name: impl Into<String>, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let original_name = original_name.into();
        let media_type = resolve_media_type(media_type, &original_name);
        Self {
            original_name,
            media_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Prefer the declared type unless it is missing or the generic binary type.
fn resolve_media_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() && declared != DEFAULT_MEDIA_TYPE => {
            declared.to_string()
        }
        _ => media_type_for_filename(filename).to_string(),
    }
}

/// Buffer exactly one file from the request.
///
/// A non-multipart request, a form with no `file` part, or a `file` part with
/// an empty filename all fail with [`AppError::MissingFile`]. A second file
/// part, or a file sent under any field other than `file`, is rejected
/// without buffering it. Other fields are drained and ignored.
pub async fn buffer_single_file(req: &HttpRequest, mut payload: Multipart) -> AppResult<IntakeFile> {
    if !req.content_type().eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
        return Err(AppError::MissingFile);
    }

    let mut file: Option<IntakeFile> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let is_file_field = field.name() == Some(FILE_FIELD);
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let declared_type = field.content_type().map(|m| m.essence_str().to_string());

        let carries_file = filename.as_deref().is_some_and(|name| !name.is_empty());
        if carries_file && !is_file_field {
            return Err(AppError::InvalidInput(format!(
                "Unexpected file field '{}', expected '{}'",
                field.name().unwrap_or_default(),
                FILE_FIELD
            )));
        }

        let bytes = read_field(&mut field).await?;

        let filename = match filename {
            Some(name) if is_file_field && !name.is_empty() => name,
            _ => {
                debug!("Skipping non-file multipart field {:?}", field.name());
                continue;
            }
        };

        if file.is_some() {
            return Err(AppError::InvalidInput(
                "Only one file may be uploaded per request".to_string(),
            ));
        }

        file = Some(IntakeFile::new(filename, declared_type.as_deref(), bytes));
    }

    file.ok_or(AppError::MissingFile)
}

async fn read_field(field: &mut Field) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}
