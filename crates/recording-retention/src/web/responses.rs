//! HTTP response types and error mapping
//!
//! Every endpoint returns the same envelope, and every [`AppError`] maps to
//! one status code, so the frontend handles failures uniformly.

use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::errors::AppError;

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: String, details: Option<HashMap<String, String>>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            details,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Shorthand for the common success case.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::PathUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RetentionInfeasible { .. } | AppError::OperationInProgress { .. } => {
                StatusCode::CONFLICT
            }
            AppError::Database(_) | AppError::Repository(_) | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let details = match &self {
            AppError::RetentionInfeasible { max_days, .. } => Some(HashMap::from([(
                "max_retention_days".to_string(),
                max_days.to_string(),
            )])),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(%status, "request failed: {self}");
        }

        (status, Json(ApiResponse::failure(self.to_string(), details))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: AppError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn errors_map_to_expected_status_codes() {
        assert_eq!(
            status_of(AppError::validation("retention_days out of range")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::not_found("storage volume", "primary")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::path_unavailable(std::path::Path::new("/mnt/gone"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::RetentionInfeasible {
                requested: 30,
                max_days: 7
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::operation_in_progress("cleanup", "all volumes")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::internal("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
