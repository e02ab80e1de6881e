//! Fairness HTTP API
//!
//! Public commitment, betting and verification endpoints, plus the
//! operator-only reveal.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{create_app, ApiServer};
