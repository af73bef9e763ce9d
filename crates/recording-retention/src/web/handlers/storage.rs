//! Storage and retention endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{
    CleanupStats, RetentionAnalysis, RetentionUpdate, SchedulerStatus, VolumeCleanupReport,
};
use crate::storage::{MAX_RETENTION_DAYS, MIN_RETENTION_DAYS};
use crate::web::AppState;
use crate::web::responses::{ApiResponse, ok};

#[derive(Debug, Deserialize)]
pub struct SetRetentionRequest {
    pub retention_days: u32,
    /// Silently lower an infeasible value instead of rejecting it.
    #[serde(default = "default_auto_adjust")]
    pub auto_adjust: bool,
}

fn default_auto_adjust() -> bool {
    true
}

fn validate_retention_bounds(days: u32) -> AppResult<()> {
    if !(MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&days) {
        return Err(AppError::validation(format!(
            "retention_days must be between {MIN_RETENTION_DAYS} and {MAX_RETENTION_DAYS}, got {days}"
        )));
    }
    Ok(())
}

/// `GET /api/v1/storage/analysis` — analyze the primary volume.
pub async fn analyze_primary(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RetentionAnalysis>>> {
    let report = state.retention.analyze(None).await?;
    Ok(ok(report))
}

/// `GET /api/v1/storage/volumes/{id}/analysis`
pub async fn analyze_volume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RetentionAnalysis>>> {
    let report = state.retention.analyze(Some(id)).await?;
    Ok(ok(report))
}

/// `PUT /api/v1/storage/volumes/{id}/retention`
pub async fn set_retention(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetRetentionRequest>,
) -> AppResult<Json<ApiResponse<RetentionUpdate>>> {
    validate_retention_bounds(request.retention_days)?;
    let update = state
        .retention
        .set_retention(id, request.retention_days, request.auto_adjust)
        .await?;
    Ok(ok(update))
}

/// `POST /api/v1/storage/volumes/{id}/cleanup`
pub async fn cleanup_volume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VolumeCleanupReport>>> {
    let report = state.scheduler.force_cleanup_volume(id).await?;
    Ok(ok(report))
}

/// `GET /api/v1/storage/scheduler`
pub async fn scheduler_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<SchedulerStatus>> {
    ok(state.scheduler.status().await)
}

/// `POST /api/v1/storage/scheduler/run`
pub async fn run_cleanup(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CleanupStats>>> {
    let stats = state.scheduler.force_cleanup().await?;
    Ok(ok(stats))
}
