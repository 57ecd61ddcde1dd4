//! API endpoint modules.

pub mod files;
pub mod health;
pub mod openapi;

pub use files::configure_routes as configure_file_routes;
pub use health::configure_health_routes;
pub use openapi::{ApiDoc, configure_routes as configure_openapi_routes};
