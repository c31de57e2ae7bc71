//! JSON HTTP API for crosspost.
//!
//! Exposes immediate publishing, job scheduling and management, and the
//! configured platforms over axum.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AppState, create_router};
