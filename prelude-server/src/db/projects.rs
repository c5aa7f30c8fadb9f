//! Project rows
//!
//! Each row holds one whole document as JSON text. Queries always filter by
//! owner, so an id that belongs to someone else reads as missing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prelude_common::model::{Project, ProjectOverview};
use prelude_common::store::{ProjectMeta, ProjectStore, ProjectUpdate, StoredProject, COPY_SUFFIX};
use prelude_common::{time, uuid_utils, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use super::timestamp;

/// Listing entry carrying the overview, for dashboards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub meta: ProjectMeta,
    pub overview: ProjectOverview,
}

#[derive(Deserialize)]
struct OverviewOnly {
    #[serde(default)]
    overview: ProjectOverview,
}

/// [`ProjectStore`] over the `projects` table, scoped to one owner
#[derive(Clone)]
pub struct SqliteProjectStore {
    pool: SqlitePool,
    owner_id: String,
}

impl SqliteProjectStore {
    pub fn for_owner(pool: SqlitePool, owner_id: impl Into<String>) -> Self {
        Self {
            pool,
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Like [`ProjectStore::list`], with each project's overview
    pub async fn list_summaries(&self) -> Result<Vec<ProjectSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, data, created_at, updated_at FROM projects
            WHERE owner_id = ?
            ORDER BY updated_at DESC, rowid DESC
            "#,
        )
        .bind(&self.owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.iter()
            .map(|row| -> Result<ProjectSummary> {
                let meta = meta_from_row(row).map_err(persistence)?;
                let data: String = row.try_get("data").map_err(persistence)?;
                let overview = match serde_json::from_str::<OverviewOnly>(&data) {
                    Ok(parsed) => parsed.overview,
                    Err(e) => {
                        warn!(project_id = %meta.id, "Unreadable project document: {}", e);
                        ProjectOverview::default()
                    }
                };
                Ok(ProjectSummary { meta, overview })
            })
            .collect()
    }

    async fn insert(&self, name: &str, mut project: Project) -> Result<StoredProject> {
        let id = uuid_utils::new_id();
        let now = time::now();
        project.id = id.clone();
        project.updated_at = now;

        let data = serde_json::to_string(&project)?;
        sqlx::query(
            r#"
            INSERT INTO projects (id, owner_id, name, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&self.owner_id)
        .bind(name)
        .bind(&data)
        .bind(timestamp(now))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        debug!(project_id = %id, owner_id = %self.owner_id, "Created project");
        self.read(&id).await
    }
}

fn persistence(e: sqlx::Error) -> Error {
    Error::Persistence(e.to_string())
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("project {}", id))
}

fn meta_from_row(row: &SqliteRow) -> sqlx::Result<ProjectMeta> {
    Ok(ProjectMeta {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl ProjectStore for SqliteProjectStore {
    async fn list(&self) -> Result<Vec<ProjectMeta>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at FROM projects
            WHERE owner_id = ?
            ORDER BY updated_at DESC, rowid DESC
            "#,
        )
        .bind(&self.owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.iter()
            .map(|row| meta_from_row(row).map_err(persistence))
            .collect()
    }

    async fn create(&self, name: &str, project: &Project) -> Result<StoredProject> {
        self.insert(name, project.clone()).await
    }

    async fn read(&self, id: &str) -> Result<StoredProject> {
        let row = sqlx::query(
            r#"
            SELECT id, name, data, created_at, updated_at FROM projects
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(&self.owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?
        .ok_or_else(|| not_found(id))?;

        let meta = meta_from_row(&row).map_err(persistence)?;
        let raw: String = row.try_get("data").map_err(persistence)?;
        let mut data = Project::from_json(&raw)?;
        data.id = meta.id.clone();

        Ok(StoredProject {
            id: meta.id,
            name: meta.name,
            data,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    async fn update(&self, id: &str, update: ProjectUpdate) -> Result<StoredProject> {
        let current = self.read(id).await?;
        let now = time::now();

        let name = update.name.unwrap_or(current.name);
        let mut data = update.project.unwrap_or(current.data);
        data.id = id.to_string();
        data.updated_at = now;
        let raw = serde_json::to_string(&data)?;

        let result = sqlx::query(
            "UPDATE projects SET name = ?, data = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(&name)
        .bind(&raw)
        .bind(timestamp(now))
        .bind(id)
        .bind(&self.owner_id)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        self.read(id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&self.owner_id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        debug!(project_id = %id, "Deleted project");
        Ok(())
    }

    async fn duplicate(&self, id: &str) -> Result<StoredProject> {
        let source = self.read(id).await?;

        let mut data = source.data;
        data.created_at = time::now();

        self.insert(&format!("{}{}", source.name, COPY_SUFFIX), data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::db::users::{create_user, NewUser};
    use chrono::TimeZone;
    use prelude_common::model::{create_empty_project, Personnel, ProjectType};
    use prelude_common::Role;

    async fn owner(pool: &SqlitePool, email: &str) -> String {
        create_user(
            pool,
            NewUser {
                email,
                name: email,
                password: Some("secret1"),
                role: Role::User,
                approved: true,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_create_read_update() {
        let pool = init_memory_database().await.unwrap();
        let store = SqliteProjectStore::for_owner(pool.clone(), owner(&pool, "a@x.io").await);

        let project = create_empty_project("Demo", ProjectType::Band);
        let stored = store.create("Demo", &project).await.unwrap();
        assert_ne!(stored.id, project.id);
        assert_eq!(stored.data.id, stored.id);

        let mut edited = stored.data.clone();
        edited.personnel.push(Personnel {
            id: "p1".into(),
            name: "Alice".into(),
            ..Default::default()
        });
        // A stale client timestamp is replaced
        let stale = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        edited.updated_at = stale;

        let updated = store.update(&stored.id, ProjectUpdate::full(&edited)).await.unwrap();
        assert_eq!(updated.data.personnel.len(), 1);
        assert!(updated.updated_at >= stored.updated_at);
        assert!(updated.data.updated_at > stale);
        assert_eq!(updated.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn test_rows_are_owner_scoped() {
        let pool = init_memory_database().await.unwrap();
        let alice = SqliteProjectStore::for_owner(pool.clone(), owner(&pool, "alice@x.io").await);
        let bob = SqliteProjectStore::for_owner(pool.clone(), owner(&pool, "bob@x.io").await);

        let stored = alice
            .create("Private", &create_empty_project("Private", ProjectType::Other))
            .await
            .unwrap();

        assert!(bob.list().await.unwrap().is_empty());
        assert!(bob.read(&stored.id).await.unwrap_err().is_not_found());
        assert!(bob
            .update(&stored.id, ProjectUpdate::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(bob.delete(&stored.id).await.unwrap_err().is_not_found());
        assert!(bob.duplicate(&stored.id).await.unwrap_err().is_not_found());
        assert_eq!(alice.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_most_recent_first_with_overview() {
        let pool = init_memory_database().await.unwrap();
        let store = SqliteProjectStore::for_owner(pool.clone(), owner(&pool, "a@x.io").await);

        let first = store
            .create("First", &create_empty_project("First", ProjectType::Band))
            .await
            .unwrap();
        store
            .create("Second", &create_empty_project("Second", ProjectType::Atmos))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .update(
                &first.id,
                ProjectUpdate {
                    name: Some("First again".into()),
                    project: None,
                },
            )
            .await
            .unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["First again", "Second"]);

        let summaries = store.list_summaries().await.unwrap();
        assert_eq!(summaries[1].overview.project_type, ProjectType::Atmos);
    }

    #[tokio::test]
    async fn test_duplicate_and_cascade() {
        let pool = init_memory_database().await.unwrap();
        let owner_id = owner(&pool, "a@x.io").await;
        let store = SqliteProjectStore::for_owner(pool.clone(), owner_id.clone());

        let stored = store
            .create("Demo", &create_empty_project("Demo", ProjectType::Band))
            .await
            .unwrap();
        let copy = store.duplicate(&stored.id).await.unwrap();
        assert_eq!(copy.name, "Demo (Copy)");
        assert_eq!(copy.data.overview, stored.data.overview);
        assert_eq!(copy.data.id, copy.id);

        assert!(crate::db::users::delete_user(&pool, &owner_id).await.unwrap());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
