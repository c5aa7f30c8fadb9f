//! Common error types for Prelude

use thiserror::Error;

/// Common result type for Prelude operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Prelude crates
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input to a mutation or import (e.g. unparsable JSON)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or storage failure while saving or loading
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Actor is not allowed to act on the resource
    #[error("Forbidden: {0}")]
    Authorization(String),

    /// No authenticated actor
    #[error("Not authenticated")]
    Unauthenticated,

    /// Project payload lacks a structurally required section
    #[error("Missing data: {0}")]
    MissingData(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that a sub-entity mutation or a stale id produces
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
