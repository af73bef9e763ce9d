use std::path::Path;

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// A volume's mount path is missing or unreadable
    #[error("Storage path not accessible: {path}")]
    PathUnavailable { path: String },

    /// Requested retention cannot be sustained by the available space
    #[error(
        "Not enough space for {requested} days of retention; maximum possible: {max_days} days"
    )]
    RetentionInfeasible { requested: u32, max_days: u32 },

    /// Operation already in progress errors
    #[error("Operation already in progress: {operation} on {resource}")]
    OperationInProgress { operation: String, resource: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },
}

/// Convenience constructors for common error types
impl AppError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<R: Into<String>, I: std::fmt::Display>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn path_unavailable(path: &Path) -> Self {
        Self::PathUnavailable {
            path: path.display().to_string(),
        }
    }

    pub fn operation_in_progress<O: Into<String>, R: Into<String>>(
        operation: O,
        resource: R,
    ) -> Self {
        Self::OperationInProgress {
            operation: operation.into(),
            resource: resource.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
