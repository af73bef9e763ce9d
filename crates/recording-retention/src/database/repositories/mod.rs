//! Repository layer
//!
//! Trait-object seams between the services and SeaORM. Tests substitute
//! in-memory implementations; production wires the SeaORM repositories.

pub mod camera;
pub mod traits;
pub mod volume;

pub use camera::CameraSeaOrmRepository;
pub use traits::{CameraCountSource, VolumeStore};
pub use volume::VolumeSeaOrmRepository;
