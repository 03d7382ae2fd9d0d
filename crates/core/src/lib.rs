//! # TaskLens Core
//!
//! The orchestration core of TaskLens:
//! - Port traits for the external sync engine and record store
//! - The sync coordinator (single-flight coalescing, min-interval gate,
//!   timeout-bounded attempts, snapshot state)
//! - The report projector (normalize, filter, sort)
//!
//! Everything in this crate is transport-agnostic; the HTTP surface and
//! the Taskwarrior adapter live in their own crates.

pub mod report;
pub mod sync;

pub use report::{project, Projection, ReportFilter, ReportSettings};
pub use sync::{EngineError, StoreError, SyncCoordinator, SyncEngine, SyncPolicy, TaskStore};
