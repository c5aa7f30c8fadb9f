//! HTTP API handlers for prelude-server

pub mod account;
pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod projects;

pub use auth::{auth_middleware, require_admin};
pub use error::{ApiError, ApiJson};
pub use health::health_routes;
