//! Liveness and readiness checks.
//!
//! `/health` only proves the process answers. `/ready` also round-trips a
//! query through the record store, since uploads cannot complete without it.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::db::DbPool;

/// Liveness payload.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    /// RFC 3339 server time
    timestamp: String,
}

/// Readiness payload.
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    status: &'static str,
    /// Record store connectivity
    database: &'static str,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Report whether upload records can currently be read and written.
///
/// Storage hosts are not contacted; a failing host shows up as
/// `STORAGE_UPLOAD_ERROR` on the upload itself.
#[utoipa::path(
    get,
    path = "/api/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Record store reachable", body = ReadyResponse),
        (status = 503, description = "Record store unreachable", body = crate::error::ErrorResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>) -> HttpResponse {
    let conn = pool.connection();
    let check = Statement::from_string(conn.get_database_backend(), "SELECT 1".to_owned());

    if let Err(e) = conn.query_one_raw(check).await {
        warn!("Record store not reachable: {}", e);
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "success": false,
            "errorCode": "NOT_READY",
            "message": "Record store unavailable"
        }));
    }

    HttpResponse::Ok().json(ReadyResponse {
        status: "ready",
        database: "connected",
    })
}

/// Register `/health` and `/ready`.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
