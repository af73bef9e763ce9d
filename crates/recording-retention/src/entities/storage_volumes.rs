use sea_orm::entity::prelude::*;

/// A configured storage destination. `status`, the byte counters, and
/// `last_checked` are observations written back by the cleanup scheduler;
/// everything else is operator configuration.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "storage_volumes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub mount_path: String,
    pub retention_days: i32,
    pub is_primary: bool,
    pub is_active: bool,
    pub status: String,
    pub total_bytes: i64,
    pub used_bytes: i64,
    pub last_checked: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
