//! Error handling for the retention service
//!
//! A small hierarchical error system: `RepositoryError` for the persistence
//! layer, `AppError` as the top-level type every service returns.

pub mod types;

pub use types::{AppError, RepositoryError};

/// Convenient result alias used throughout the application
pub type AppResult<T> = Result<T, AppError>;
