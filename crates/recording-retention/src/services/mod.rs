//! Service layer
//!
//! Two services own the subsystem's behavior: [`RetentionService`] answers
//! analysis queries and applies retention changes, and [`CleanupScheduler`]
//! runs the periodic enforcement loop.

pub mod cleanup_scheduler;
pub mod retention;

pub use cleanup_scheduler::CleanupScheduler;
pub use retention::RetentionService;
