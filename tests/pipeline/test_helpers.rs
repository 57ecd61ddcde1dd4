//! Shared helpers for pipeline tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::{App, dev::ServiceResponse, test, web};
use async_trait::async_trait;
use qrshare_lib::api;
use qrshare_lib::config::DatabaseSettings;
use qrshare_lib::db::{DbPool, RecordStore};
use qrshare_lib::error::{AppError, AppResult};
use qrshare_lib::middleware::RequestLogger;
use qrshare_lib::models::{NewUploadRecord, UploadRecord};
use qrshare_lib::services::{DataUri, QrCodeGenerator, StorageProvider, StoredObject, UploadPipeline};
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

/// Public origin used when building download links in tests.
pub const TEST_BASE_URL: &str = "https://share.test";

pub const BOUNDARY: &str = "----qrshare-test-boundary";

/// Storage host double that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<Vec<(String, Vec<u8>)>>,
    pub deletes: AtomicUsize,
    pub fail_uploads: bool,
}

impl MemoryStorage {
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn upload(&self, content: &DataUri) -> AppResult<StoredObject> {
        if self.fail_uploads {
            return Err(AppError::StorageUpload(
                "storage host unreachable".to_string(),
            ));
        }
        let decoded = content.decode()?;
        let mut objects = self.objects.lock().unwrap();
        let storage_id = format!("objects/{}", objects.len());
        objects.push((decoded.media_type, decoded.bytes));
        Ok(StoredObject {
            public_url: format!("https://storage.test/{}", storage_id),
            storage_id,
            resource_type: Some("raw".to_string()),
        })
    }

    async fn delete(&self, _object: &StoredObject) -> AppResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }
}

/// Record store that mints ids but rejects every write.
pub struct RejectingStore;

#[async_trait]
impl RecordStore for RejectingStore {
    fn allocate_id(&self) -> Uuid {
        Uuid::now_v7()
    }

    async fn create(&self, _record: NewUploadRecord) -> AppResult<UploadRecord> {
        Err(AppError::Persistence("database is read-only".to_string()))
    }

    async fn get_by_id(&self, id: &str) -> AppResult<UploadRecord> {
        Err(AppError::RecordNotFound(format!("File {}", id)))
    }
}

/// Create a migrated SQLite pool inside `dir`.
pub async fn create_test_pool(dir: &TempDir) -> DbPool {
    let settings = DatabaseSettings {
        url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("pipeline.db").display()
        ),
        max_connections: 1,
        min_connections: 1,
    };
    let pool = DbPool::new(&settings)
        .await
        .expect("Failed to open SQLite database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// Create a test app wired the same way as the server binary.
pub async fn create_test_app(
    pool: &DbPool,
    store: Arc<dyn RecordStore>,
    storage: Arc<MemoryStorage>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let pipeline = UploadPipeline::new(store, storage, QrCodeGenerator::default(), TEST_BASE_URL);

    test::init_service(
        App::new()
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(pipeline))
            .service(
                web::scope("/api")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_file_routes)
                    .configure(api::configure_openapi_routes),
            ),
    )
    .await
}

/// One part of a multipart form body.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST a multipart form to the upload endpoint.
pub async fn upload_parts<S>(app: &S, parts: &[Part<'_>]) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// GET a download link, returning the status, `Location` header and body.
pub async fn download<S>(app: &S, id: &str) -> (u16, Option<String>, Vec<u8>)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/download/{}", id))
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = test::read_body(resp).await.to_vec();
    (status, location, body)
}

/// Decode the text held in a PNG QR code `data:` URI.
pub fn decode_qr(data_uri: &str) -> String {
    let decoded = DataUri::parse(data_uri)
        .and_then(|uri| uri.decode())
        .expect("QR code is not a valid data URI");
    assert_eq!(decoded.media_type, "image/png");

    let img = image::load_from_memory(&decoded.bytes)
        .expect("QR code is not a PNG")
        .to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code");
    let (_meta, content) = grids[0].decode().expect("QR code did not decode");
    content
}
