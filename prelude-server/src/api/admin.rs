//! Administrator endpoints: account management, backup and restore
//!
//! Mounted behind both the authentication and the admin-role middleware.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use prelude_common::{time, Actor, Error, Role};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::account::{validate_email, validate_name, validate_password};
use super::{ApiError, ApiJson};
use crate::db::backup::{self, Backup, RestoreReport, BACKUP_VERSION};
use crate::db::users::{self, NewUser, User, UserChanges, UserWithCount};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserListEnvelope {
    pub users: Vec<UserWithCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: RestoreReport,
}

fn user_not_found(id: &str) -> ApiError {
    Error::NotFound(format!("user {}", id)).into()
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListEnvelope>, ApiError> {
    let users = users::list_users(&state.db).await?;
    Ok(Json(UserListEnvelope { users }))
}

/// POST /api/admin/users
///
/// Accounts created by an administrator are approved immediately.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    validate_email(&body.email)?;
    validate_password(&body.password)?;
    validate_name(&body.name)?;

    if users::find_by_email(&state.db, &body.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let user = users::create_user(
        &state.db,
        NewUser {
            email: &body.email,
            name: &body.name,
            password: Some(&body.password),
            role: body.role,
            approved: true,
        },
    )
    .await?;
    info!(user_id = %user.id, role = %user.role, "Administrator created account");
    Ok((StatusCode::CREATED, Json(UserEnvelope { user })))
}

/// PUT /api/admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> Result<Json<UserEnvelope>, ApiError> {
    if id == actor.id && changes.role == Some(Role::User) {
        return Err(ApiError::BadRequest("Cannot remove your own admin role".into()));
    }
    if let Some(email) = changes.email.as_deref() {
        validate_email(email)?;
        if let Some(other) = users::find_by_email(&state.db, email).await? {
            if other.id != id {
                return Err(ApiError::Conflict("Email already registered".into()));
            }
        }
    }
    if let Some(password) = changes.password.as_deref() {
        validate_password(password)?;
    }
    if let Some(name) = changes.name.as_deref() {
        validate_name(name)?;
    }

    let user = users::update_user(&state.db, &id, changes)
        .await?
        .ok_or_else(|| user_not_found(&id))?;
    Ok(Json(UserEnvelope { user }))
}

/// DELETE /api/admin/users/:id
///
/// Removes the account and all of its projects.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if id == actor.id {
        return Err(ApiError::BadRequest("Cannot delete your own account".into()));
    }
    if !users::delete_user(&state.db, &id).await? {
        return Err(user_not_found(&id));
    }
    info!(user_id = %id, "Account deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// GET /api/admin/backup
pub async fn backup(State(state): State<AppState>) -> Result<Response, ApiError> {
    let backup = backup::export_backup(&state.db).await?;
    let disposition = format!(
        "attachment; filename=\"prelude-backup-{}.json\"",
        time::iso_date(backup.exported_at)
    );
    info!(
        users = backup.users.len(),
        projects = backup.projects.len(),
        "Backup exported"
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(backup)).into_response())
}

/// POST /api/admin/restore
pub async fn restore(
    State(state): State<AppState>,
    ApiJson(backup): ApiJson<Backup>,
) -> Result<Json<RestoreResponse>, ApiError> {
    if backup.version != BACKUP_VERSION {
        return Err(Error::Validation(format!("unsupported backup version {}", backup.version)).into());
    }

    let report = backup::restore_backup(&state.db, &backup).await?;
    Ok(Json(RestoreResponse {
        message: "Restore completed".into(),
        report,
    }))
}
