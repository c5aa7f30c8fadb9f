//! Whole-database backup and merge-style restore
//!
//! A backup lists every account (without credentials) and every project with
//! its document as a JSON string. Restoring never overwrites: accounts are
//! matched by email, and a project is skipped when its owner already has one
//! with the same name.

use chrono::{DateTime, Utc};
use prelude_common::model::Project;
use prelude_common::{uuid_utils, Role};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::{info, warn};

use super::{set_setting, timestamp};
use crate::password::UNUSABLE_HASH;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    #[serde(default = "prelude_common::time::now")]
    pub exported_at: DateTime<Utc>,
    pub users: Vec<BackupUser>,
    pub projects: Vec<BackupProject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupProject {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// The project document as JSON text
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub users_imported: usize,
    pub users_skipped: usize,
    pub projects_imported: usize,
    pub projects_skipped: usize,
}

/// Snapshot of all accounts and projects, oldest first
pub async fn export_backup(pool: &SqlitePool) -> sqlx::Result<Backup> {
    let user_rows = sqlx::query(
        "SELECT id, email, name, role, approved, created_at, updated_at FROM users ORDER BY created_at, rowid",
    )
    .fetch_all(pool)
    .await?;

    let mut users = Vec::with_capacity(user_rows.len());
    for row in &user_rows {
        let role: String = row.try_get("role")?;
        users.push(BackupUser {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: role.parse::<Role>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            approved: row.try_get("approved")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        });
    }

    let project_rows = sqlx::query(
        "SELECT id, owner_id, name, data, created_at, updated_at FROM projects ORDER BY created_at, rowid",
    )
    .fetch_all(pool)
    .await?;

    let projects = project_rows
        .iter()
        .map(|row| -> sqlx::Result<BackupProject> {
            Ok(BackupProject {
                id: row.try_get("id")?,
                user_id: row.try_get("owner_id")?,
                name: row.try_get("name")?,
                data: row.try_get("data")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()?;

    Ok(Backup {
        version: BACKUP_VERSION,
        exported_at: Utc::now(),
        users,
        projects,
    })
}

/// Merge a backup into the database in one transaction
pub async fn restore_backup(pool: &SqlitePool, backup: &Backup) -> sqlx::Result<RestoreReport> {
    let mut report = RestoreReport::default();
    let mut owner_ids: HashMap<&str, String> = HashMap::new();
    let mut tx = pool.begin().await?;

    for user in &backup.users {
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(&user.email)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(id) = existing {
            owner_ids.insert(user.id.as_str(), id);
            report.users_skipped += 1;
            continue;
        }

        // Restored accounts sign in only after an administrator sets a password
        let id = uuid_utils::new_id();
        let now = timestamp(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, approved, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(UNUSABLE_HASH)
        .bind(user.role.as_str())
        .bind(user.approved)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        owner_ids.insert(user.id.as_str(), id);
        report.users_imported += 1;
    }

    for project in &backup.projects {
        let Some(owner_id) = owner_ids.get(project.user_id.as_str()) else {
            report.projects_skipped += 1;
            continue;
        };

        let taken: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE owner_id = ? AND name = ?")
                .bind(owner_id)
                .bind(&project.name)
                .fetch_one(&mut *tx)
                .await?;
        if taken > 0 {
            report.projects_skipped += 1;
            continue;
        }

        let id = uuid_utils::new_id();
        let mut document = match Project::from_json(&project.data) {
            Ok(document) => document,
            Err(e) => {
                warn!(project = %project.name, "Skipping unreadable project in backup: {}", e);
                report.projects_skipped += 1;
                continue;
            }
        };
        document.id = id.clone();
        let data = serde_json::to_string(&document)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let now = timestamp(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO projects (id, owner_id, name, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&project.name)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        report.projects_imported += 1;
    }

    tx.commit().await?;
    set_setting(pool, "last_restore_at", &timestamp(Utc::now())).await?;

    info!(
        users_imported = report.users_imported,
        users_skipped = report.users_skipped,
        projects_imported = report.projects_imported,
        projects_skipped = report.projects_skipped,
        "Restore completed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::{create_user, find_by_email, verify_credentials, NewUser};
    use crate::db::{get_setting, init_memory_database, SqliteProjectStore};
    use prelude_common::model::{create_empty_project, ProjectType};
    use prelude_common::ProjectStore;

    async fn populated() -> SqlitePool {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(
            &pool,
            NewUser {
                email: "alice@example.com",
                name: "Alice",
                password: Some("secret1"),
                role: Role::User,
                approved: true,
            },
        )
        .await
        .unwrap();
        let store = SqliteProjectStore::for_owner(pool.clone(), user.id);
        for name in ["Album", "EP"] {
            store
                .create(name, &create_empty_project(name, ProjectType::Band))
                .await
                .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_backup_lists_everything() {
        let pool = populated().await;
        let backup = export_backup(&pool).await.unwrap();

        assert_eq!(backup.version, 1);
        assert_eq!(backup.users.len(), 1);
        assert_eq!(backup.projects.len(), 2);
        assert_eq!(backup.projects[0].user_id, backup.users[0].id);
        assert!(Project::from_json(&backup.projects[0].data).is_ok());

        let json = serde_json::to_value(&backup).unwrap();
        assert!(json["users"][0].get("passwordHash").is_none());
        assert!(json["projects"][0]["data"].is_string());
    }

    #[tokio::test]
    async fn test_restore_into_empty_database() {
        let backup = export_backup(&populated().await).await.unwrap();
        let target = init_memory_database().await.unwrap();

        let report = restore_backup(&target, &backup).await.unwrap();
        assert_eq!(
            report,
            RestoreReport {
                users_imported: 1,
                users_skipped: 0,
                projects_imported: 2,
                projects_skipped: 0,
            }
        );

        let alice = find_by_email(&target, "alice@example.com").await.unwrap().unwrap();
        assert_ne!(alice.id, backup.users[0].id);
        assert!(verify_credentials(&target, "alice@example.com", "secret1")
            .await
            .unwrap()
            .is_none());

        let store = SqliteProjectStore::for_owner(target.clone(), alice.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
        assert!(get_setting(&target, "last_restore_at").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restore_twice_skips_everything() {
        let pool = populated().await;
        let backup = export_backup(&pool).await.unwrap();

        let report = restore_backup(&pool, &backup).await.unwrap();
        assert_eq!(
            report,
            RestoreReport {
                users_imported: 0,
                users_skipped: 1,
                projects_imported: 0,
                projects_skipped: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_project_with_unknown_owner_is_skipped() {
        let pool = init_memory_database().await.unwrap();
        let document = create_empty_project("Orphan", ProjectType::Other);
        let backup = Backup {
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            users: vec![],
            projects: vec![BackupProject {
                id: "p".into(),
                user_id: "ghost".into(),
                name: "Orphan".into(),
                data: serde_json::to_string(&document).unwrap(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
        };

        let report = restore_backup(&pool, &backup).await.unwrap();
        assert_eq!(report.projects_skipped, 1);
        assert_eq!(report.projects_imported, 0);
    }
}
