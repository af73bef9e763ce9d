//! SeaORM camera repository
//!
//! Read-only: retention sizing only needs the number of active cameras.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use super::traits::CameraCountSource;
use crate::entities::{cameras, prelude::*};
use crate::errors::RepositoryError;

#[derive(Clone)]
pub struct CameraSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl CameraSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl CameraCountSource for CameraSeaOrmRepository {
    async fn active_camera_count(&self) -> Result<usize, RepositoryError> {
        let count = Cameras::find()
            .filter(cameras::Column::IsActive.eq(true))
            .count(&*self.connection)
            .await?;
        Ok(count as usize)
    }
}
