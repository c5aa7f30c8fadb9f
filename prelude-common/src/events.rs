//! Event types and EventBus
//!
//! Save outcomes of the debounced saver and bulk export progress are published
//! here so front ends can report them without blocking editing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events published by the editing session and the bulk exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreludeEvent {
    /// Latest project state reached the store
    ProjectSaved {
        project_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A save failed; local state is kept and editing continues
    ProjectSaveFailed {
        project_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A project became the current project of an editing session
    ProjectLoaded {
        project_id: String,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// One bulk export item finished (successfully or not)
    BulkExportProgress {
        current: usize,
        total: usize,
        project_id: String,
        succeeded: bool,
    },

    /// Bulk export archive is ready
    BulkExportFinished {
        archive_name: String,
        succeeded: usize,
        failed: usize,
    },
}

impl PreludeEvent {
    pub fn event_type(&self) -> &str {
        match self {
            PreludeEvent::ProjectSaved { .. } => "ProjectSaved",
            PreludeEvent::ProjectSaveFailed { .. } => "ProjectSaveFailed",
            PreludeEvent::ProjectLoaded { .. } => "ProjectLoaded",
            PreludeEvent::BulkExportProgress { .. } => "BulkExportProgress",
            PreludeEvent::BulkExportFinished { .. } => "BulkExportFinished",
        }
    }
}

/// Broadcast bus for [`PreludeEvent`]
///
/// Receivers that lag further than `capacity` events behind lose the oldest ones.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PreludeEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PreludeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PreludeEvent,
    ) -> Result<usize, broadcast::error::SendError<PreludeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PreludeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
