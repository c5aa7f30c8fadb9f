//! Sign-in, self-registration and the caller's own account

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use prelude_common::{Error, Role};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{ApiError, ApiJson};
use crate::db::users::{self, NewUser, User};
use crate::password::MIN_PASSWORD_LEN;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Public view of the signed-in account
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<User> for AccountView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: AccountView,
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid email address: {}", email)).into())
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".into()).into());
    }
    Ok(())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = users::verify_credentials(&state.db, &body.email, &body.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !user.approved {
        return Err(Error::Authorization("Account pending approval".into()).into());
    }

    let token = users::issue_token(&state.db, &user.id).await?;
    info!(user_id = %user.id, "Signed in");
    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/register
///
/// Approved accounts are signed in straight away; otherwise the response
/// says the account awaits an administrator.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    if !state.accounts.allow_registration {
        return Err(Error::Authorization("Registration is disabled".into()).into());
    }

    validate_email(&body.email)?;
    validate_password(&body.password)?;
    validate_name(&body.name)?;

    if users::find_by_email(&state.db, &body.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let approved = !state.accounts.require_approval;
    let user = users::create_user(
        &state.db,
        NewUser {
            email: &body.email,
            name: &body.name,
            password: Some(&body.password),
            role: Role::User,
            approved,
        },
    )
    .await?;
    info!(user_id = %user.id, approved, "Registered account");

    if !approved {
        let body = json!({
            "message": "Registration successful. Awaiting admin approval.",
            "approved": false,
        });
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    }

    let token = users::issue_token(&state.db, &user.id).await?;
    let body = SessionResponse {
        token,
        user: user.into(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// GET /api/auth/me
pub async fn me(Extension(user): Extension<User>) -> Json<serde_json::Value> {
    Json(json!({ "user": AccountView::from(user) }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<serde_json::Value>, ApiError> {
    users::revoke_token(&state.db, &user.id).await?;
    info!(user_id = %user.id, "Signed out");
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// PUT /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_password(&body.new_password)?;

    if users::verify_credentials(&state.db, &user.email, &body.current_password)
        .await?
        .is_none()
    {
        return Err(ApiError::InvalidCredentials);
    }

    users::set_password(&state.db, &user.id, &body.new_password).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("a.b@studio.co.uk").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("user name@example.com").is_err());
    }

    #[test]
    fn test_password_and_name_validation() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name("Sam").is_ok());
    }
}
