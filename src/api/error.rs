use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::handlers::{RegistryError, UnknownField, UnknownSearchMode};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{message}")]
    Conflict {
        message: String,
        conflicts: Vec<String>,
    },
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let conflicts = match &self {
            ApiError::Conflict { conflicts, .. } => conflicts.clone(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
            conflicts,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidArgument(_)
            | RegistryError::UnknownField(_)
            | RegistryError::FieldNotSupported(_) => ApiError::InvalidArgument(err.to_string()),
            RegistryError::Conflict(conflict) => ApiError::Conflict {
                message: conflict.to_string(),
                conflicts: conflict
                    .conflicting_ids()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            RegistryError::Format(_) | RegistryError::Storage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<UnknownField> for ApiError {
    fn from(err: UnknownField) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}

impl From<UnknownSearchMode> for ApiError {
    fn from(err: UnknownSearchMode) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}
