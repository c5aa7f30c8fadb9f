//! # Prelude Common Library
//!
//! Shared code for the Prelude pre-production planner:
//! - Project document model (the single JSON payload persisted per project)
//! - Error taxonomy shared by editor and server
//! - Persistence collaborator contract (`ProjectStore`)
//! - Actor/role contract for authorization checks
//! - Event types and EventBus
//! - Configuration loading
//! - Utility functions

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod store;
pub mod time;
pub mod uuid_utils;

pub use auth::{Actor, Role};
pub use error::{Error, Result};
pub use model::{Project, ProjectType};
pub use store::ProjectStore;
