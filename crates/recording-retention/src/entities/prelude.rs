pub use super::cameras::Entity as Cameras;
pub use super::storage_volumes::Entity as StorageVolumes;
