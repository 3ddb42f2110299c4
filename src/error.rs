use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Caller-visible failures. Every handler returns `Result<_, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Availability was updated concurrently, please retry")]
    Conflict,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidStatus(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::StorageUnavailable(e) | AppError::Internal(e) => {
                tracing::error!("request failed: {e:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation => AppError::Conflict,
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::Unavailable(e) => AppError::StorageUnavailable(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidStatus("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(StoreError::ConstraintViolation).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_failure_hides_details() {
        let err = AppError::StorageUnavailable(anyhow::anyhow!("connection refused to 10.0.0.3"));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
