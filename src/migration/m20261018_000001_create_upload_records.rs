//! Create upload_records table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UploadRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UploadRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UploadRecords::OriginalName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UploadRecords::StorageUrl).text().not_null())
                    .col(
                        ColumnDef::new(UploadRecords::StorageObjectId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UploadRecords::CodeImage).text().not_null())
                    .col(
                        ColumnDef::new(UploadRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_upload_records_created_at")
                    .table(UploadRecords::Table)
                    .col(UploadRecords::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UploadRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UploadRecords {
    Table,
    Id,
    OriginalName,
    StorageUrl,
    StorageObjectId,
    CodeImage,
    CreatedAt,
}
