//! Web API module for Baketsu.
//!
//! This module provides the REST API for storage billing, file metadata
//! and folders.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use openapi::ApiDoc;
pub use router::create_router;
pub use server::WebServer;
