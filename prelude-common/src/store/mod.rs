//! Persistence collaborator contract
//!
//! A [`ProjectStore`] handle is always scoped to one owner: every call reads
//! or writes only that owner's projects, and ids belonging to other owners
//! resolve to `NotFound`.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Project;
use crate::Result;

pub use memory::MemoryProjectStore;

/// Listing entry for a stored project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted project with its store-assigned id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    pub id: String,
    pub name: String,
    pub data: Project,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredProject {
    pub fn meta(&self) -> ProjectMeta {
        ProjectMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// The document, carrying the store-assigned id
    pub fn into_project(self) -> Project {
        let mut project = self.data;
        project.id = self.id;
        project
    }
}

/// Fields replaced by [`ProjectStore::update`]; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

impl ProjectUpdate {
    /// Full-document replacement as issued by the debounced saver
    pub fn full(project: &Project) -> Self {
        Self {
            name: Some(project.overview.name.clone()),
            project: Some(project.clone()),
        }
    }
}

/// Suffix appended to the name of a duplicated project
pub const COPY_SUFFIX: &str = " (Copy)";

/// Owner-scoped project persistence
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Metadata for every project of the owner, most recently updated first
    async fn list(&self) -> Result<Vec<ProjectMeta>>;

    /// Persist a new project; the store assigns the definitive id
    async fn create(&self, name: &str, project: &Project) -> Result<StoredProject>;

    async fn read(&self, id: &str) -> Result<StoredProject>;

    /// Replace the name and/or document of an existing project
    async fn update(&self, id: &str, update: ProjectUpdate) -> Result<StoredProject>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Copy a project under a new id with the name suffixed and fresh timestamps
    async fn duplicate(&self, id: &str) -> Result<StoredProject>;
}
