//! # filestore-api
//!
//! HTTP API layer for FileStore built on Axum.
//!
//! Provides the REST endpoints, middleware (CORS, request logging, the error
//! envelope), extractors, DTOs and the mapping from domain errors to HTTP
//! responses.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
