//! In-process project store
//!
//! Used by offline command line runs and by tests. Handles created with
//! [`MemoryProjectStore::for_owner`] share the same underlying map.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{ProjectMeta, ProjectStore, ProjectUpdate, StoredProject, COPY_SUFFIX};
use crate::model::Project;
use crate::{time, uuid_utils, Error, Result};

#[derive(Debug, Clone)]
struct Row {
    owner_id: String,
    stored: StoredProject,
}

#[derive(Default)]
struct Shared {
    rows: Mutex<HashMap<String, Row>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

#[derive(Clone)]
pub struct MemoryProjectStore {
    owner_id: String,
    shared: Arc<Shared>,
}

impl MemoryProjectStore {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Handle onto the same storage scoped to another owner
    pub fn for_owner(&self, owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Number of successful `update` calls across all owners
    pub fn write_count(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail with a persistence error
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("store unavailable".into()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Row>>> {
        self.shared
            .rows
            .lock()
            .map_err(|_| Error::Internal("project store lock poisoned".into()))
    }

    fn insert(&self, name: String, mut project: Project) -> Result<StoredProject> {
        let id = uuid_utils::new_id();
        let now = time::now();
        project.id = id.clone();

        let stored = StoredProject {
            id: id.clone(),
            name,
            data: project,
            created_at: now,
            updated_at: now,
        };

        self.lock()?.insert(
            id,
            Row {
                owner_id: self.owner_id.clone(),
                stored: stored.clone(),
            },
        );
        Ok(stored)
    }

    fn not_found(id: &str) -> Error {
        Error::NotFound(format!("project {}", id))
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn list(&self) -> Result<Vec<ProjectMeta>> {
        let rows = self.lock()?;
        let mut metas: Vec<ProjectMeta> = rows
            .values()
            .filter(|row| row.owner_id == self.owner_id)
            .map(|row| row.stored.meta())
            .collect();
        metas.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(metas)
    }

    async fn create(&self, name: &str, project: &Project) -> Result<StoredProject> {
        self.check_writable()?;
        let stored = self.insert(name.to_string(), project.clone())?;
        debug!(project_id = %stored.id, "Created project in memory store");
        Ok(stored)
    }

    async fn read(&self, id: &str) -> Result<StoredProject> {
        let rows = self.lock()?;
        rows.get(id)
            .filter(|row| row.owner_id == self.owner_id)
            .map(|row| row.stored.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn update(&self, id: &str, update: ProjectUpdate) -> Result<StoredProject> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        let row = rows
            .get_mut(id)
            .filter(|row| row.owner_id == self.owner_id)
            .ok_or_else(|| Self::not_found(id))?;

        if let Some(name) = update.name {
            row.stored.name = name;
        }
        if let Some(mut project) = update.project {
            project.id = id.to_string();
            row.stored.data = project;
        }
        row.stored.updated_at = time::now();

        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(row.stored.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        let owned = rows.get(id).is_some_and(|row| row.owner_id == self.owner_id);
        if !owned {
            return Err(Self::not_found(id));
        }
        rows.remove(id);
        Ok(())
    }

    async fn duplicate(&self, id: &str) -> Result<StoredProject> {
        self.check_writable()?;
        let source = self.read(id).await?;

        let mut data = source.data;
        let now = time::now();
        data.created_at = now;
        data.updated_at = now;

        self.insert(format!("{}{}", source.name, COPY_SUFFIX), data)
    }
}
