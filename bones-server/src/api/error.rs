//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bones_pipeline::RegistryError;

use crate::service::project_service::ProjectError;
use crate::service::project_type_service::ProjectTypeError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RegistryError::Conflict(msg) => ApiError::Conflict(msg),
            RegistryError::Transition { .. } => ApiError::Conflict(err.to_string()),
            RegistryError::Storage(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::NotFound(id) => ApiError::NotFound(format!("Project {} not found", id)),
            ProjectError::TypeNotFound(slug) => {
                ApiError::NotFound(format!("Project type '{}' not found", slug))
            }
            ProjectError::ValidationError(msg) => ApiError::BadRequest(msg),
            ProjectError::Conflict(msg) => ApiError::Conflict(msg),
            ProjectError::Registry(err) => err.into(),
        }
    }
}

impl From<ProjectTypeError> for ApiError {
    fn from(err: ProjectTypeError) -> Self {
        match err {
            ProjectTypeError::NotFound(slug) => {
                ApiError::NotFound(format!("Project type '{}' not found", slug))
            }
            ProjectTypeError::ValidationError(msg) => ApiError::BadRequest(msg),
            ProjectTypeError::Conflict(msg) => ApiError::Conflict(msg),
            ProjectTypeError::Registry(err) => err.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
