//! Synchronization controller

pub mod saver;
pub mod session;

pub use saver::{DebouncedSaver, DEFAULT_QUIET_PERIOD};
pub use session::{EditingSession, SessionConfig};
