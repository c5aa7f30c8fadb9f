//! Editing session: the owner of "current project"
//!
//! A session holds the project list, the open project and the section cursor.
//! Mutations land locally first and are persisted by the [`DebouncedSaver`];
//! any change of the open project flushes the pending save before it happens.

use prelude_common::events::{EventBus, PreludeEvent};
use prelude_common::model::{create_empty_project, Project, ProjectType, Section};
use prelude_common::store::{ProjectMeta, ProjectStore};
use prelude_common::{time, uuid_utils, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::saver::{DebouncedSaver, DEFAULT_QUIET_PERIOD};
use crate::mutation::{self, Mutation, MutationOutcome};

/// Session tunables
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub save_quiet_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

pub struct EditingSession<S: ProjectStore + 'static> {
    store: Arc<S>,
    saver: DebouncedSaver<S>,
    events: EventBus,
    project_list: Vec<ProjectMeta>,
    current: Option<Project>,
    section: Section,
}

impl<S: ProjectStore + 'static> EditingSession<S> {
    pub fn new(store: Arc<S>, events: EventBus, config: SessionConfig) -> Self {
        let saver = DebouncedSaver::new(Arc::clone(&store), events.clone(), config.save_quiet_period);
        Self {
            store,
            saver,
            events,
            project_list: Vec::new(),
            current: None,
            section: Section::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn project_list(&self) -> &[ProjectMeta] {
        &self.project_list
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.id.as_str())
    }

    pub fn current_section(&self) -> Section {
        self.section
    }

    pub fn has_pending_save(&self) -> bool {
        self.saver.has_pending()
    }

    /// Reload project metadata from the store
    pub async fn refresh_list(&mut self) -> Result<&[ProjectMeta]> {
        self.project_list = self.store.list().await?;
        Ok(&self.project_list)
    }

    /// Create an empty project, persist it and open it
    pub async fn create_project(&mut self, name: &str, project_type: ProjectType) -> Result<String> {
        self.flush_logged().await;

        let provisional = create_empty_project(name, project_type);
        let stored = self.store.create(name, &provisional).await?;

        let mut project = provisional;
        project.id = stored.id.clone();

        info!(project_id = %stored.id, "Created project {:?}", name);
        self.project_list.push(stored.meta());
        self.open(project);
        Ok(stored.id)
    }

    /// Open a stored project, replacing the current one
    ///
    /// On failure the session is left with no open project.
    pub async fn load_project(&mut self, id: &str) -> Result<&Project> {
        self.flush_logged().await;

        match self.store.read(id).await {
            Ok(stored) => {
                self.open(stored.into_project());
                self.current
                    .as_ref()
                    .ok_or_else(|| Error::Internal("project vanished after load".into()))
            }
            Err(e) => {
                warn!(project_id = %id, "Failed to load project: {}", e);
                self.current = None;
                self.section = Section::default();
                Err(e)
            }
        }
    }

    fn open(&mut self, project: Project) {
        self.events.emit_lossy(PreludeEvent::ProjectLoaded {
            project_id: project.id.clone(),
            name: project.overview.name.clone(),
            timestamp: time::now(),
        });
        self.current = Some(project);
        self.section = Section::default();
    }

    /// Apply a mutation to the open project and schedule a save
    ///
    /// The new state is visible as soon as this returns; persistence happens
    /// later. With no open project the outcome is `NotFound`.
    pub fn apply(&mut self, mutation: Mutation) -> MutationOutcome {
        let Some(current) = self.current.as_ref() else {
            return MutationOutcome::NotFound;
        };

        let label = mutation.describe();
        let (next, outcome) = mutation::apply(current, mutation);
        debug!(project_id = %next.id, mutation = %label, ?outcome, "Applied mutation");

        if outcome.is_applied() {
            if let Some(meta) = self.project_list.iter_mut().find(|m| m.id == next.id) {
                meta.name = next.overview.name.clone();
                meta.updated_at = next.updated_at;
            }
            self.saver.schedule(next.clone());
            self.current = Some(next);
        }
        outcome
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    /// Move the cursor forward, skipping sections hidden for the project type
    pub fn next_section(&mut self) -> Section {
        if let Some(project) = &self.current {
            if let Some(next) = self.section.next(project.project_type()) {
                self.section = next;
            }
        }
        self.section
    }

    pub fn previous_section(&mut self) -> Section {
        if let Some(project) = &self.current {
            if let Some(previous) = self.section.previous(project.project_type()) {
                self.section = previous;
            }
        }
        self.section
    }

    /// Copy a stored project; the open project is not affected
    pub async fn duplicate_project(&mut self, id: &str) -> Result<String> {
        if self.current_id() == Some(id) {
            self.flush_logged().await;
        }
        let copy = self.store.duplicate(id).await?;
        info!(project_id = %id, copy_id = %copy.id, "Duplicated project");
        self.refresh_list().await?;
        Ok(copy.id)
    }

    /// Delete a stored project, closing it if it is open
    pub async fn delete_project(&mut self, id: &str) -> Result<()> {
        self.saver.discard(id);
        self.store.delete(id).await?;

        self.project_list.retain(|m| m.id != id);
        if self.current_id() == Some(id) {
            self.current = None;
            self.section = Section::default();
        }
        info!(project_id = %id, "Deleted project");
        Ok(())
    }

    /// Persist a previously exported payload as a new project
    ///
    /// The payload's id and timestamps are replaced. Unknown fields are
    /// ignored and absent collections default to empty. A malformed payload
    /// fails without touching the session.
    pub async fn import_project(&mut self, raw: &str) -> Result<String> {
        let mut project = Project::from_json(raw)?;

        let now = time::now();
        project.id = uuid_utils::new_id();
        project.created_at = now;
        project.updated_at = now;

        let name = project.overview.name.clone();
        let stored = self.store.create(&name, &project).await?;
        info!(project_id = %stored.id, "Imported project {:?}", name);
        self.project_list.push(stored.meta());
        Ok(stored.id)
    }

    /// The open project, if `id` is the open one
    pub fn export_project(&self, id: &str) -> Option<&Project> {
        self.current.as_ref().filter(|p| p.id == id)
    }

    /// Write any pending save now
    pub async fn flush(&self) -> Result<()> {
        self.saver.flush().await.map(|_| ())
    }

    /// Flush and close the open project
    pub async fn close(&mut self) -> Result<()> {
        let flushed = self.flush().await;
        self.current = None;
        self.section = Section::default();
        flushed
    }

    async fn flush_logged(&self) {
        if let Err(e) = self.flush().await {
            warn!("Pending save failed before switching projects: {}", e);
        }
    }
}
