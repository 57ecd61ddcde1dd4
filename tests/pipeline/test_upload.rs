//! Upload endpoint scenarios.

use std::sync::Arc;

use qrshare_lib::db::RecordStore;

use super::test_helpers::*;

/// (1) A 10-byte text file is stored, recorded and linked by its QR code.
#[actix_rt::test]
async fn test_upload_note_returns_record_with_qr_code() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, body) =
        upload_parts(&app, &[Part::file("note.txt", "text/plain", b"0123456789")]).await;

    assert_eq!(status, 200, "Upload should succeed: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "File uploaded successfully.");

    let file = &body["file"];
    assert_eq!(file["filename"], "note.txt");
    let url = file["cloudinaryUrl"].as_str().unwrap();
    assert!(url.starts_with("https://"));
    assert!(file["cloudinaryPublicId"].is_string());
    assert!(file["createdAt"].is_string());

    let qr_code = file["qrCode"].as_str().unwrap();
    assert!(qr_code.starts_with("data:image/png;base64,"));
    let id = file["id"].as_str().unwrap();
    assert_eq!(
        decode_qr(qr_code),
        format!("{}/api/download/{}", TEST_BASE_URL, id)
    );

    assert_eq!(pool.count_upload_records().await.unwrap(), 1);
    let stored = pool.get_by_id(id).await.unwrap();
    assert_eq!(stored.storage_url, url);
}

/// (2) The storage host receives the original bytes and declared type.
#[actix_rt::test]
async fn test_upload_forwards_content_to_storage() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, _) = upload_parts(
        &app,
        &[
            Part::text("comment", "ignored"),
            Part::file("note.txt", "text/plain", b"0123456789"),
        ],
    )
    .await;
    assert_eq!(status, 200);

    let objects = storage.objects.lock().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].0, "text/plain");
    assert_eq!(objects[0].1, b"0123456789");
}

/// (3) A generic declared type falls back to the file extension.
#[actix_rt::test]
async fn test_upload_infers_media_type_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, _) = upload_parts(
        &app,
        &[Part::file("chart.png", "application/octet-stream", &[0x89, b'P', b'N', b'G'])],
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(storage.objects.lock().unwrap()[0].0, "image/png");
}

/// (4) A form without a file part is rejected before any side effect.
#[actix_rt::test]
async fn test_upload_without_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, body) = upload_parts(&app, &[Part::text("comment", "no file here")]).await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No file uploaded.");
    assert_eq!(body["errorCode"], "MISSING_FILE");
    assert_eq!(pool.count_upload_records().await.unwrap(), 0);
    assert_eq!(storage.upload_count(), 0);
}

/// (5) A non-multipart request is treated as carrying no file.
#[actix_rt::test]
async fn test_upload_json_body_is_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let req = actix_web::test::TestRequest::post()
        .uri("/api/upload")
        .set_json(serde_json::json!({ "file": "note.txt" }))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["errorCode"], "MISSING_FILE");
    assert_eq!(storage.upload_count(), 0);
}

/// (6) Two file parts in one request are rejected.
#[actix_rt::test]
async fn test_upload_two_files_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, body) = upload_parts(
        &app,
        &[
            Part::file("a.txt", "text/plain", b"a"),
            Part::file("b.txt", "text/plain", b"b"),
        ],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["errorCode"], "INVALID_INPUT");
    assert_eq!(storage.upload_count(), 0);
    assert_eq!(pool.count_upload_records().await.unwrap(), 0);
}

/// (7) An unreachable storage host fails the upload and writes nothing.
#[actix_rt::test]
async fn test_storage_failure_returns_500_without_record() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::failing());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, body) =
        upload_parts(&app, &[Part::file("note.txt", "text/plain", b"0123456789")]).await;

    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "STORAGE_UPLOAD_ERROR");
    assert!(body["error"].as_str().unwrap().contains("unreachable"));
    assert_eq!(pool.count_upload_records().await.unwrap(), 0);
    assert_eq!(storage.delete_count(), 0);
}

/// (8) A rejected record write removes the already stored object once.
#[actix_rt::test]
async fn test_persistence_failure_deletes_stored_object() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let store: Arc<dyn RecordStore> = Arc::new(RejectingStore);
    let app = create_test_app(&pool, store, storage.clone()).await;

    let (status, body) =
        upload_parts(&app, &[Part::file("note.txt", "text/plain", b"0123456789")]).await;

    assert_eq!(status, 500);
    assert_eq!(body["errorCode"], "PERSISTENCE_ERROR");
    assert_eq!(storage.upload_count(), 1);
    assert_eq!(storage.delete_count(), 1);
}

/// (9) Two uploads of the same file produce two distinct records.
#[actix_rt::test]
async fn test_repeated_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (_, first) =
        upload_parts(&app, &[Part::file("note.txt", "text/plain", b"0123456789")]).await;
    let (_, second) =
        upload_parts(&app, &[Part::file("note.txt", "text/plain", b"0123456789")]).await;

    assert_ne!(first["file"]["id"], second["file"]["id"]);
    assert_ne!(first["file"]["qrCode"], second["file"]["qrCode"]);
    assert_eq!(pool.count_upload_records().await.unwrap(), 2);
}

/// (10) A file under any field other than `file` is refused, not ignored.
#[actix_rt::test]
async fn test_upload_under_wrong_field_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_test_pool(&dir).await;
    let storage = Arc::new(MemoryStorage::default());
    let app = create_test_app(&pool, Arc::new(pool.clone()), storage.clone()).await;

    let (status, body) = upload_parts(
        &app,
        &[Part {
            name: "attachment",
            filename: Some("note.txt"),
            content_type: Some("text/plain"),
            data: b"0123456789",
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["errorCode"], "INVALID_INPUT");
    assert!(body["error"].as_str().unwrap().contains("attachment"));
    assert_eq!(storage.upload_count(), 0);
    assert_eq!(pool.count_upload_records().await.unwrap(), 0);
}
