//! Mama - media-aware static file server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod buffer_pool;
pub mod config;
pub mod mime;
pub mod server;
pub mod transform;

/// Name reported for the served root in listings.
pub const APP_NAME: &str = "mama";
