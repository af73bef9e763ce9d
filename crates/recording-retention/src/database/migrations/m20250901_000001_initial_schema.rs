use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_storage_volumes_table(manager).await?;
        self.create_cameras_table(manager).await?;
        self.create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cameras::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StorageVolumes::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_storage_volumes_table(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StorageVolumes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StorageVolumes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(StorageVolumes::MountPath).string().not_null())
                    .col(
                        ColumnDef::new(StorageVolumes::RetentionDays)
                            .integer()
                            .not_null()
                            .default(7),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::TotalBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::UsedBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(StorageVolumes::LastChecked).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(StorageVolumes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StorageVolumes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_cameras_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cameras::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cameras::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Cameras::Name).string().not_null())
                    .col(
                        ColumnDef::new(Cameras::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Cameras::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cameras::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_storage_volumes_is_active")
                    .table(StorageVolumes::Table)
                    .col(StorageVolumes::IsActive)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cameras_is_active")
                    .table(Cameras::Table)
                    .col(Cameras::IsActive)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum StorageVolumes {
    Table,
    Id,
    Name,
    MountPath,
    RetentionDays,
    IsPrimary,
    IsActive,
    Status,
    TotalBytes,
    UsedBytes,
    LastChecked,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Cameras {
    Table,
    Id,
    Name,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
