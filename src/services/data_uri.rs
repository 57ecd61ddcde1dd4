//! `data:` URI encoding of buffered uploads.
//!
//! The storage host receives the whole file as a single self-describing
//! string: `data:<media type>;base64,<payload>`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AppError, AppResult};

/// Media type used when neither the client nor the file name says otherwise.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

const BASE64_MARKER: &str = ";base64,";

/// A base64 `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri(String);

/// Raw bytes recovered from a [`DataUri`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedContent {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Encode bytes with their media type.
    pub fn encode(media_type: &str, bytes: &[u8]) -> Self {
        let media_type = media_type.trim();
        let media_type = if media_type.is_empty() {
            DEFAULT_MEDIA_TYPE
        } else {
            media_type
        };

        Self(format!(
            "data:{}{}{}",
            media_type,
            BASE64_MARKER,
            STANDARD.encode(bytes)
        ))
    }

    /// Validate an existing string as a base64 `data:` URI.
    pub fn parse(value: &str) -> AppResult<Self> {
        let uri = Self(value.to_string());
        uri.split()?;
        Ok(uri)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Media type embedded in the URI.
    pub fn media_type(&self) -> AppResult<&str> {
        self.split().map(|(media_type, _)| media_type)
    }

    /// Recover the original bytes and media type.
    pub fn decode(&self) -> AppResult<DecodedContent> {
        let (media_type, payload) = self.split()?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| AppError::Encoding(format!("Invalid base64 payload: {}", e)))?;

        Ok(DecodedContent {
            media_type: media_type.to_string(),
            bytes,
        })
    }

    fn split(&self) -> AppResult<(&str, &str)> {
        let rest = self
            .0
            .strip_prefix("data:")
            .ok_or_else(|| AppError::Encoding("Content URI must start with 'data:'".to_string()))?;

        let (media_type, payload) = rest.split_once(BASE64_MARKER).ok_or_else(|| {
            AppError::Encoding("Content URI is not base64 encoded".to_string())
        })?;

        if media_type.is_empty() {
            return Err(AppError::Encoding(
                "Content URI is missing its media type".to_string(),
            ));
        }

        Ok((media_type, payload))
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Guess a media type from a file name's extension.
pub fn media_type_for_filename(filename: &str) -> &'static str {
    let ext = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return DEFAULT_MEDIA_TYPE,
    };

    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => DEFAULT_MEDIA_TYPE,
    }
}
