//! QR code rendering for retrieval links.
//!
//! Output is a PNG wrapped in a `data:` URI so clients can render it without
//! another request.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::error::{AppError, AppResult};
use crate::services::data_uri::DataUri;

/// Deterministic QR encoder.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeGenerator {
    ec_level: EcLevel,
    /// Edge length of one module in pixels
    module_size: u32,
}

impl Default for QrCodeGenerator {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::M,
            module_size: 4,
        }
    }
}

impl QrCodeGenerator {
    pub fn new(ec_level: EcLevel, module_size: u32) -> Self {
        Self {
            ec_level,
            module_size: module_size.max(1),
        }
    }

    /// Encode `target` as a PNG QR code `data:` URI.
    ///
    /// Fails with [`AppError::Encoding`] when the text exceeds what the
    /// symbology can hold at the configured error correction level.
    pub fn encode(&self, target: &str) -> AppResult<String> {
        let code = QrCode::with_error_correction_level(target.as_bytes(), self.ec_level)
            .map_err(|e| {
                AppError::Encoding(format!(
                    "Cannot encode {} bytes as a QR code: {}",
                    target.len(),
                    e
                ))
            })?;

        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_size, self.module_size)
            .quiet_zone(true)
            .build();

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| AppError::Encoding(format!("Failed to write QR code PNG: {}", e)))?;

        Ok(DataUri::encode("image/png", &png).into_string())
    }
}
