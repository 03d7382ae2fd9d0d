//! Sync orchestration: ports and the coordinator.

pub mod coordinator;
pub mod ports;

pub use coordinator::{SyncCoordinator, SyncPolicy};
pub use ports::{EngineError, StoreError, SyncEngine, TaskStore};
