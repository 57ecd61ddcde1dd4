//! Database module providing connection management, migrations, and the record store.

pub mod upload_records;

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;
use crate::models::{NewUploadRecord, UploadRecord};

/// Append-only store of upload records.
///
/// Identifiers are minted by the store; callers never invent their own.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reserve a fresh identifier for a record about to be created.
    fn allocate_id(&self) -> Uuid;

    /// Persist a new record and return it as stored.
    async fn create(&self, record: NewUploadRecord) -> AppResult<UploadRecord>;

    /// Look up a record by its external identifier.
    ///
    /// Unknown identifiers yield `RecordNotFound`; identifiers that are not in
    /// the store's format yield `Persistence`.
    async fn get_by_id(&self, id: &str) -> AppResult<UploadRecord>;
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready (max_connections={}, min_connections={})",
            settings.max_connections, settings.min_connections
        );

        Ok(Self { conn })
    }

    /// Apply pending schema migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to run migrations: {}", e)))
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}
