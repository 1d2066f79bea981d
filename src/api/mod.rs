//! HTTP API layer for Warden Core.
//!
//! Provides a health endpoint and the authentication endpoints.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
