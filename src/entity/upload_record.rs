//! UploadRecord entity for SeaORM.
//!
//! One row per successful upload. Rows are written once and never updated.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "upload_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub original_name: String,
    #[sea_orm(column_type = "Text")]
    pub storage_url: String,
    pub storage_object_id: String,
    #[sea_orm(column_type = "Text")]
    pub code_image: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
