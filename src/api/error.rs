use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::{ApiResponse, FieldError};
use crate::services::{AuthError, PostError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    ValidationFailed(Vec<FieldError>),

    Unauthorized(String),

    Forbidden(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::ValidationFailed(errors) => {
                write!(f, "Validation failed for {} field(s)", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, ApiResponse<()>) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::error(msg)),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, ApiResponse::error(msg)),
            ApiError::ValidationFailed(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::validation_errors("Invalid input data", errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ApiResponse::error(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::error(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::error(msg)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("A database error occurred"),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("An internal error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            AuthError::AlreadyExists(msg) => ApiError::Conflict(msg),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            // The service payload names the id or slug; clients get the
            // generic message.
            PostError::NotFound(_) => ApiError::NotFound("Post not found".to_string()),
            PostError::DuplicateSlug(slug) => {
                ApiError::Conflict(format!("A post with slug '{}' already exists", slug))
            }
            PostError::Validation(msg) => ApiError::ValidationError(msg),
            PostError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl ApiError {
    pub fn post_not_found() -> Self {
        ApiError::NotFound("Post not found".to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
