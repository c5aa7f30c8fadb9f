//! Account queries

use chrono::{DateTime, Utc};
use prelude_common::{uuid_utils, Actor, Role};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::timestamp;
use crate::config::SeedAdmin;
use crate::password::{self, UNUSABLE_HASH};

const USER_COLUMNS: &str = "id, email, name, role, approved, created_at, updated_at";

/// Account as exposed over the API (never carries credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role)
    }

    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: role.parse::<Role>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            approved: row.try_get("approved")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Admin listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithCount {
    #[serde(flatten)]
    pub user: User,
    pub project_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    /// `None` creates an account that cannot sign in yet
    pub password: Option<&'a str>,
    pub role: Role,
    pub approved: bool,
}

/// Fields replaced by [`update_user`]; `None` leaves a field as is
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub approved: Option<bool>,
}

fn hash_error(e: bcrypt::BcryptError) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(e))
}

pub async fn create_user(pool: &SqlitePool, new: NewUser<'_>) -> sqlx::Result<User> {
    let hash = match new.password {
        Some(plain) => password::hash_password(plain).map_err(hash_error)?,
        None => UNUSABLE_HASH.to_string(),
    };
    let id = uuid_utils::new_id();
    let now = timestamp(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, approved, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.email)
    .bind(new.name)
    .bind(&hash)
    .bind(new.role.as_str())
    .bind(new.approved)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    find_by_id(pool, &id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| User::from_row(&row))
        .transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?
        .map(|row| User::from_row(&row))
        .transpose()
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE api_token = ?", USER_COLUMNS);
    sqlx::query(&query)
        .bind(token)
        .fetch_optional(pool)
        .await?
        .map(|row| User::from_row(&row))
        .transpose()
}

/// Every account with its project count, newest first
pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<UserWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.email, u.name, u.role, u.approved, u.created_at, u.updated_at,
               COUNT(p.id) AS project_count
        FROM users u
        LEFT JOIN projects p ON p.owner_id = u.id
        GROUP BY u.id
        ORDER BY u.created_at DESC, u.rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> sqlx::Result<UserWithCount> {
            Ok(UserWithCount {
                user: User::from_row(row)?,
                project_count: row.try_get("project_count")?,
            })
        })
        .collect()
}

/// The account when `plain` matches its stored digest
pub async fn verify_credentials(
    pool: &SqlitePool,
    email: &str,
    plain: &str,
) -> sqlx::Result<Option<User>> {
    let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let hash: String = row.try_get("password_hash")?;
    if !password::verify_password(plain, &hash) {
        return Ok(None);
    }

    let id: String = row.try_get("id")?;
    find_by_id(pool, &id).await
}

/// Replace the account's API token; earlier tokens stop working
pub async fn issue_token(pool: &SqlitePool, user_id: &str) -> sqlx::Result<String> {
    let token = password::new_token();
    sqlx::query("UPDATE users SET api_token = ? WHERE id = ?")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

pub async fn revoke_token(pool: &SqlitePool, user_id: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET api_token = NULL WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply `changes`; `None` when the account does not exist
pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    changes: UserChanges,
) -> sqlx::Result<Option<User>> {
    let Some(current) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let email = changes.email.unwrap_or(current.email);
    let name = changes.name.unwrap_or(current.name);
    let role = changes.role.unwrap_or(current.role);
    let approved = changes.approved.unwrap_or(current.approved);

    sqlx::query(
        "UPDATE users SET email = ?, name = ?, role = ?, approved = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&email)
    .bind(&name)
    .bind(role.as_str())
    .bind(approved)
    .bind(timestamp(Utc::now()))
    .bind(id)
    .execute(pool)
    .await?;

    if let Some(plain) = changes.password.as_deref() {
        set_password(pool, id, plain).await?;
    }

    find_by_id(pool, id).await
}

pub async fn set_password(pool: &SqlitePool, id: &str, plain: &str) -> sqlx::Result<()> {
    let hash = password::hash_password(plain).map_err(hash_error)?;
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&hash)
        .bind(timestamp(Utc::now()))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove an account and, by cascade, its projects
pub async fn delete_user(pool: &SqlitePool, id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn admin_exists(pool: &SqlitePool) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Create the configured administrator when no admin account exists
///
/// Returns whether an account was created.
pub async fn ensure_seed_admin(pool: &SqlitePool, seed: &SeedAdmin) -> sqlx::Result<bool> {
    if admin_exists(pool).await? {
        return Ok(false);
    }

    if let Some(existing) = find_by_email(pool, &seed.email).await? {
        update_user(
            pool,
            &existing.id,
            UserChanges {
                role: Some(Role::Admin),
                approved: Some(true),
                ..Default::default()
            },
        )
        .await?;
        info!(email = %seed.email, "Promoted existing account to administrator");
        return Ok(true);
    }

    create_user(
        pool,
        NewUser {
            email: &seed.email,
            name: &seed.name,
            password: Some(&seed.password),
            role: Role::Admin,
            approved: true,
        },
    )
    .await?;
    info!(email = %seed.email, "Created seed administrator");
    Ok(true)
}
