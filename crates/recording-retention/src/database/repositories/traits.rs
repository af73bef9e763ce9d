//! Repository traits the services depend on.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::models::{StorageVolume, VolumeObservation};

/// Persistence operations for storage volumes.
#[async_trait]
pub trait VolumeStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StorageVolume>, RepositoryError>;

    /// The volume marked primary, if any.
    async fn find_primary(&self) -> Result<Option<StorageVolume>, RepositoryError>;

    /// Every volume enabled for cleanup, in name order.
    async fn list_active(&self) -> Result<Vec<StorageVolume>, RepositoryError>;

    async fn set_retention_days(&self, id: Uuid, days: u32) -> Result<(), RepositoryError>;

    /// Write back a scheduler observation (status, capacity, check time).
    async fn record_observation(
        &self,
        id: Uuid,
        observation: VolumeObservation,
    ) -> Result<(), RepositoryError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: crate::models::VolumeStatus,
    ) -> Result<(), RepositoryError>;
}

/// Source of the active camera count used by retention sizing.
#[async_trait]
pub trait CameraCountSource: Send + Sync {
    async fn active_camera_count(&self) -> Result<usize, RepositoryError>;
}
