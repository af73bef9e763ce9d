//! SeaORM storage-volume repository

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::traits::VolumeStore;
use crate::entities::{prelude::*, storage_volumes};
use crate::errors::RepositoryError;
use crate::models::{StorageVolume, VolumeObservation, VolumeStatus};

#[derive(Clone)]
pub struct VolumeSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl VolumeSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    async fn active_model_for(
        &self,
        id: Uuid,
    ) -> Result<storage_volumes::ActiveModel, RepositoryError> {
        let model = StorageVolumes::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::RecordNotFound {
                table: "storage_volumes".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            })?;
        Ok(model.into())
    }
}

/// Convert a persisted row to the domain model. Unknown status strings and
/// negative counters (hand-edited rows) degrade safely instead of failing.
fn to_domain(model: storage_volumes::Model) -> StorageVolume {
    StorageVolume {
        id: model.id,
        name: model.name,
        mount_path: PathBuf::from(model.mount_path),
        retention_days: model.retention_days.max(0) as u32,
        is_primary: model.is_primary,
        is_active: model.is_active,
        status: model.status.parse().unwrap_or(VolumeStatus::Error),
        total_bytes: model.total_bytes.max(0) as u64,
        used_bytes: model.used_bytes.max(0) as u64,
        last_checked: model.last_checked,
    }
}

#[async_trait]
impl VolumeStore for VolumeSeaOrmRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StorageVolume>, RepositoryError> {
        let model = StorageVolumes::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(to_domain))
    }

    async fn find_primary(&self) -> Result<Option<StorageVolume>, RepositoryError> {
        let model = StorageVolumes::find()
            .filter(storage_volumes::Column::IsPrimary.eq(true))
            .filter(storage_volumes::Column::IsActive.eq(true))
            .one(&*self.connection)
            .await?;
        Ok(model.map(to_domain))
    }

    async fn list_active(&self) -> Result<Vec<StorageVolume>, RepositoryError> {
        let models = StorageVolumes::find()
            .filter(storage_volumes::Column::IsActive.eq(true))
            .order_by_asc(storage_volumes::Column::Name)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn set_retention_days(&self, id: Uuid, days: u32) -> Result<(), RepositoryError> {
        let mut active = self.active_model_for(id).await?;
        active.retention_days = Set(days as i32);
        active.updated_at = Set(chrono::Utc::now());
        active.update(&*self.connection).await?;
        Ok(())
    }

    async fn record_observation(
        &self,
        id: Uuid,
        observation: VolumeObservation,
    ) -> Result<(), RepositoryError> {
        let mut active = self.active_model_for(id).await?;
        active.status = Set(observation.status.to_string());
        active.total_bytes = Set(observation.total_bytes.min(i64::MAX as u64) as i64);
        active.used_bytes = Set(observation.used_bytes.min(i64::MAX as u64) as i64);
        active.last_checked = Set(Some(observation.last_checked));
        active.updated_at = Set(chrono::Utc::now());
        active.update(&*self.connection).await?;
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: VolumeStatus) -> Result<(), RepositoryError> {
        let mut active = self.active_model_for(id).await?;
        active.status = Set(status.to_string());
        active.updated_at = Set(chrono::Utc::now());
        active.update(&*self.connection).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_strings_degrade_to_error() {
        let model = storage_volumes::Model {
            id: Uuid::new_v4(),
            name: "primary".to_string(),
            mount_path: "/mnt/recordings".to_string(),
            retention_days: -3,
            is_primary: true,
            is_active: true,
            status: "corrupted".to_string(),
            total_bytes: -1,
            used_bytes: 42,
            last_checked: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let volume = to_domain(model);
        assert_eq!(volume.status, VolumeStatus::Error);
        assert_eq!(volume.retention_days, 0);
        assert_eq!(volume.total_bytes, 0);
        assert_eq!(volume.used_bytes, 42);
    }
}
