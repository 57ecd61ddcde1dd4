//! Upload and download API handlers.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::UploadResponse;
use crate::services::{UploadPipeline, UploadStage, buffer_single_file};

/// Multipart form accepted by the upload endpoint.
#[derive(ToSchema)]
pub struct UploadForm {
    /// The file to share
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Upload a file and receive a QR code linking to it.
///
/// The stored record is returned once the content is on the storage host and
/// the record is persisted.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Files",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored and QR code generated", body = UploadResponse),
        (status = 400, description = "No file uploaded or malformed form", body = crate::error::ErrorResponse),
        (status = 500, description = "Upload pipeline failed", body = crate::error::ErrorResponse),
    )
)]
pub async fn upload_file(
    req: HttpRequest,
    payload: Multipart,
    pipeline: web::Data<UploadPipeline>,
) -> AppResult<HttpResponse> {
    debug!(
        stage = %UploadStage::Received,
        "Upload received: content_type={}",
        req.content_type()
    );
    let file = buffer_single_file(&req, payload).await?;

    // Detached so a dropped connection cannot abort a half-finished upload
    let pipeline = pipeline.get_ref().clone();
    let record = tokio::spawn(async move { pipeline.upload(file).await })
        .await
        .map_err(|e| {
            error!("Upload task failed to complete: {}", e);
            AppError::Internal(format!("Upload task failed: {}", e))
        })??;

    Ok(HttpResponse::Ok().json(UploadResponse::new(record)))
}

/// Redirect to the stored content of a record.
#[utoipa::path(
    get,
    path = "/api/download/{id}",
    tag = "Files",
    params(
        ("id" = String, Path, description = "Record identifier")
    ),
    responses(
        (status = 302, description = "Redirect to the stored content"),
        (status = 404, description = "No record with this id", body = crate::error::ErrorResponse),
        (status = 500, description = "Record lookup failed", body = crate::error::ErrorResponse),
    )
)]
pub async fn download_file(
    path: web::Path<String>,
    pipeline: web::Data<UploadPipeline>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let location = pipeline.resolve_download(&id).await?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish())
}

/// Configure file routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/upload").route(web::post().to(upload_file)))
        .service(web::resource("/download/{id}").route(web::get().to(download_file)));
}
