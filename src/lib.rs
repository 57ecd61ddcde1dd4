//! QR share server library.
//!
//! Buffers an uploaded file, stores it on a remote object host, renders a
//! QR code for its download link and persists the record.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
