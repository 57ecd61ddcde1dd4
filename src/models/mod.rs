//! Domain models exposed over the HTTP API.

pub mod upload_record;

pub use upload_record::{NewUploadRecord, UploadRecord, UploadResponse};
