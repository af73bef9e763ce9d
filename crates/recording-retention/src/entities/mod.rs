//! SeaORM entities for the persisted schema.

pub mod prelude;

pub mod cameras;
pub mod storage_volumes;
