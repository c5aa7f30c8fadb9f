//! HTTP error responses
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}` with
//! a status derived from the error kind.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prelude_common::Error;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => match e {
                Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::Authorization(_) => StatusCode::FORBIDDEN,
                Error::Unauthenticated => StatusCode::UNAUTHORIZED,
                Error::MissingData(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Persistence(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => match e {
                Error::Validation(_) | Error::Json(_) => "validation",
                Error::NotFound(_) => "not_found",
                Error::Authorization(_) => "forbidden",
                Error::Unauthenticated => "unauthenticated",
                Error::MissingData(_) => "missing_data",
                Error::Persistence(_) => "persistence",
                Error::Io(_) | Error::Config(_) | Error::Internal(_) => "internal",
            },
            ApiError::Database(_) => "persistence",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Conflict(_) => "conflict",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// JSON body extractor whose rejection uses the API error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(Error::NotFound("project x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::from(Error::Unauthenticated).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(Error::Authorization("admin role required".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(Error::MissingData("overview".into())).code(),
            "missing_data"
        );
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = ApiError::from(Error::Persistence("disk full at /var".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "persistence");
        assert_eq!(body["error"]["message"], "Internal server error");
    }
}
