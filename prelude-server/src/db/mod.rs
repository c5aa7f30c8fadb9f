//! Database initialization and queries
//!
//! One SQLite file holds the accounts, their projects (one JSON document per
//! row) and a small settings table. Every table is created idempotently on
//! startup.

pub mod backup;
pub mod projects;
pub mod users;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub use projects::SqliteProjectStore;

pub const SCHEMA_VERSION: i64 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (creating if needed) the database file and bring the schema up
pub async fn init_database(db_path: &Path) -> sqlx::Result<SqlitePool> {
    let newly_created = !db_path.exists();

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database, used by tests
///
/// A single long-lived connection: each new in-memory connection would be a
/// separate empty database.
pub async fn init_memory_database() -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    create_users_table(pool).await?;
    create_projects_table(pool).await?;
    create_settings_table(pool).await?;
    ensure_setting(pool, "schema_version", &SCHEMA_VERSION.to_string()).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN')),
            approved INTEGER NOT NULL DEFAULT 0,
            api_token TEXT UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_projects_table(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_projects_owner_updated ON projects(owner_id, updated_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Key-value settings
pub async fn create_settings_table(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a setting unless it already has a value
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value WHERE settings.value IS NULL
        "#,
    )
    .bind(key)
    .bind(default_value)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_setting(pool: &SqlitePool, key: &str) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, Option<String>>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map(Option::flatten)
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fixed-width UTC text form, so lexical order is chronological order
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_schema(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["projects", "settings", "users"]);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(get_setting(&pool, "schema_version").await.unwrap().as_deref(), Some("1"));
        assert_eq!(get_setting(&pool, "missing").await.unwrap(), None);

        set_setting(&pool, "last_restore_at", "2025-01-01T00:00:00.000Z").await.unwrap();
        set_setting(&pool, "last_restore_at", "2025-02-01T00:00:00.000Z").await.unwrap();
        assert_eq!(
            get_setting(&pool, "last_restore_at").await.unwrap().as_deref(),
            Some("2025-02-01T00:00:00.000Z")
        );
    }

    #[tokio::test]
    async fn test_file_database_created_on_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prelude.db");
        assert!(!path.exists());

        let pool = init_database(&path).await.unwrap();
        pool.close().await;
        assert!(path.exists());

        // Reopening keeps the schema
        let pool = init_database(&path).await.unwrap();
        assert_eq!(get_setting(&pool, "schema_version").await.unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_timestamp_is_fixed_width() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(timestamp(at), "2025-03-04T05:06:07.000Z");
    }
}
