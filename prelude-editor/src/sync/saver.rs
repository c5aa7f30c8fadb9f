//! Debounced persistence
//!
//! Every [`DebouncedSaver::schedule`] replaces the pending snapshot and
//! restarts the quiet period, so a burst of edits produces a single write of
//! the latest state. Writes go through one async lock: a [`DebouncedSaver::flush`]
//! issued while a timer write is in flight waits for it and then writes
//! whatever is newer, never the other way round.

use prelude_common::events::{EventBus, PreludeEvent};
use prelude_common::model::Project;
use prelude_common::store::{ProjectStore, ProjectUpdate};
use prelude_common::{time, Error, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Quiet period before a scheduled save is written
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

struct Shared<S> {
    store: Arc<S>,
    events: EventBus,
    pending: Mutex<Option<Project>>,
    timer: Mutex<Option<CancellationToken>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl<S: ProjectStore> Shared<S> {
    fn lock_pending(&self) -> Result<std::sync::MutexGuard<'_, Option<Project>>> {
        self.pending
            .lock()
            .map_err(|_| Error::Internal("save queue lock poisoned".into()))
    }

    fn cancel_timer(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(token) = timer.take() {
                token.cancel();
            }
        }
    }

    /// Write the pending snapshot, if any; `Ok(true)` when something was written
    async fn write_pending(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let next = {
            let mut pending = self.lock_pending()?;
            pending.take()
        };
        let Some(project) = next else {
            return Ok(false);
        };

        let project_id = project.id.clone();
        match self.store.update(&project_id, ProjectUpdate::full(&project)).await {
            Ok(_) => {
                debug!(project_id = %project_id, "Project saved");
                self.events.emit_lossy(PreludeEvent::ProjectSaved {
                    project_id,
                    timestamp: time::now(),
                });
                Ok(true)
            }
            Err(e) => {
                warn!(project_id = %project_id, "Failed to save project: {}", e);
                self.events.emit_lossy(PreludeEvent::ProjectSaveFailed {
                    project_id,
                    error: e.to_string(),
                    timestamp: time::now(),
                });
                Err(e)
            }
        }
    }
}

pub struct DebouncedSaver<S> {
    shared: Arc<Shared<S>>,
    quiet_period: Duration,
}

impl<S: ProjectStore + 'static> DebouncedSaver<S> {
    pub fn new(store: Arc<S>, events: EventBus, quiet_period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                events,
                pending: Mutex::new(None),
                timer: Mutex::new(None),
                write_lock: tokio::sync::Mutex::new(()),
            }),
            quiet_period,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Queue `project` for saving after the quiet period
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, project: Project) {
        match self.shared.lock_pending() {
            Ok(mut pending) => {
                if let Some(previous) = pending.as_ref() {
                    if previous.id != project.id {
                        warn!(
                            project_id = %previous.id,
                            "Pending save replaced by another project without a flush"
                        );
                    }
                }
                *pending = Some(project);
            }
            Err(e) => {
                warn!("Cannot schedule save: {}", e);
                return;
            }
        }

        let token = CancellationToken::new();
        if let Ok(mut timer) = self.shared.timer.lock() {
            if let Some(previous) = timer.replace(token.clone()) {
                previous.cancel();
            }
        }

        let shared = Arc::clone(&self.shared);
        let quiet_period = self.quiet_period;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(quiet_period) => {
                    // Failures are already logged and published
                    let _ = shared.write_pending().await;
                }
            }
        });
    }

    /// Cancel the timer and write the latest pending state now
    pub async fn flush(&self) -> Result<bool> {
        self.shared.cancel_timer();
        self.shared.write_pending().await
    }

    /// Drop a pending save for `project_id` without writing it
    pub fn discard(&self, project_id: &str) {
        if let Ok(mut pending) = self.shared.pending.lock() {
            if pending.as_ref().is_some_and(|p| p.id == project_id) {
                self.shared.cancel_timer();
                *pending = None;
                debug!(project_id = %project_id, "Discarded pending save");
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.shared
            .pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prelude_common::model::{create_empty_project, ProjectType};
    use prelude_common::store::MemoryProjectStore;

    const QUIET: Duration = Duration::from_millis(40);

    async fn stored_project(store: &MemoryProjectStore) -> Project {
        let project = create_empty_project("Demo", ProjectType::Band);
        store.create("Demo", &project).await.unwrap().into_project()
    }

    fn renamed(project: &Project, name: &str) -> Project {
        let mut next = project.clone();
        next.overview.name = name.to_string();
        next
    }

    #[tokio::test]
    async fn test_burst_collapses_into_one_write() {
        let store = Arc::new(MemoryProjectStore::new("owner"));
        let project = stored_project(&store).await;
        let saver = DebouncedSaver::new(Arc::clone(&store), EventBus::new(10), QUIET);

        for i in 0..5 {
            saver.schedule(renamed(&project, &format!("Edit {}", i)));
        }
        tokio::time::sleep(QUIET * 4).await;

        assert_eq!(store.write_count(), 1);
        let saved = store.read(&project.id).await.unwrap();
        assert_eq!(saved.name, "Edit 4");
        assert!(!saver.has_pending());
    }

    #[tokio::test]
    async fn test_flush_writes_immediately_and_cancels_timer() {
        let store = Arc::new(MemoryProjectStore::new("owner"));
        let project = stored_project(&store).await;
        let saver = DebouncedSaver::new(Arc::clone(&store), EventBus::new(10), Duration::from_secs(60));

        saver.schedule(renamed(&project, "Flushed"));
        assert!(saver.flush().await.unwrap());
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.read(&project.id).await.unwrap().name, "Flushed");

        assert!(!saver.flush().await.unwrap());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_published() {
        let store = Arc::new(MemoryProjectStore::new("owner"));
        let project = stored_project(&store).await;
        let events = EventBus::new(10);
        let mut rx = events.subscribe();
        let saver = DebouncedSaver::new(Arc::clone(&store), events, QUIET);

        store.set_fail_writes(true);
        saver.schedule(renamed(&project, "Lost"));
        assert!(saver.flush().await.is_err());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "ProjectSaveFailed");
    }

    #[tokio::test]
    async fn test_discard_drops_pending() {
        let store = Arc::new(MemoryProjectStore::new("owner"));
        let project = stored_project(&store).await;
        let saver = DebouncedSaver::new(Arc::clone(&store), EventBus::new(10), QUIET);

        saver.schedule(renamed(&project, "Never"));
        saver.discard(&project.id);
        tokio::time::sleep(QUIET * 3).await;

        assert_eq!(store.write_count(), 0);
    }
}
