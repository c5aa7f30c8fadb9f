//! Prelude editor library
//!
//! Client side of the planner: the mutation engine, the editing session with
//! debounced saving, export shaping with its renderers, and the bulk export
//! orchestrator. The `prelude` binary drives these against a Prelude server.

pub mod bulk;
pub mod config;
pub mod export;
pub mod http_store;
pub mod mutation;
pub mod sync;

pub use bulk::{BulkArchive, ExportJob, FailurePolicy, JobState};
pub use export::ExportFormat;
pub use http_store::HttpProjectStore;
pub use mutation::{apply, Mutation, MutationOutcome};
pub use sync::{DebouncedSaver, EditingSession, SessionConfig};
