//! Authentication middleware
//!
//! Protected routes require `Authorization: Bearer <token>` with a token
//! issued at login. The resolved account and its [`Actor`] are placed in the
//! request extensions for handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use prelude_common::auth::{current_actor, require_role};
use prelude_common::{Actor, Error, Role};
use tracing::warn;

use super::ApiError;
use crate::db::users;
use crate::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the bearer token to an approved account
///
/// Returns 401 when the token is missing or unknown and 403 when the
/// account still awaits approval.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or(Error::Unauthenticated)?;
    let user = users::find_by_token(&state.db, &token)
        .await?
        .ok_or(Error::Unauthenticated)?;

    if !user.approved {
        warn!(user_id = %user.id, "Rejected request from unapproved account");
        return Err(Error::Authorization("Account pending approval".into()).into());
    }

    request.extensions_mut().insert(user.actor());
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Gate on the administrator role; runs inside [`auth_middleware`]
pub async fn require_admin(
    actor: Option<Extension<Actor>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = current_actor(actor.map(|Extension(actor)| actor))?;
    require_role(&actor, Role::Admin)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
