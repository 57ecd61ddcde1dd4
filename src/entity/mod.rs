//! SeaORM entity definitions.

pub mod upload_record;
