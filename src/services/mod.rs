//! Business logic services.

pub mod data_uri;
pub mod intake;
pub mod pipeline;
pub mod qr_code;
pub mod storage;

pub use data_uri::DataUri;
pub use intake::{IntakeFile, buffer_single_file};
pub use pipeline::{UploadPipeline, UploadStage};
pub use qr_code::QrCodeGenerator;
pub use storage::{StorageProvider, StoredObject, build_provider};
