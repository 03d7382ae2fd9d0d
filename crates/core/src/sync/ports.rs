//! Port interfaces for the external collaborators
//!
//! The synchronization engine and the record store are externally owned;
//! the core only decides when to call them and how to shape what it reads
//! back. Adapters implement these traits in the infra crate.

use async_trait::async_trait;
use tasklens_domain::TaskRecord;
use thiserror::Error;

/// Classified failure of one sync attempt.
///
/// Retained in the snapshot for diagnostics; never surfaced to clients.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Sync server unreachable: {0}")]
    Unreachable(String),

    #[error("Sync credentials rejected: {0}")]
    AuthRejected(String),

    #[error("Replica decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Sync failed: {0}")]
    Other(String),
}

/// Failure to read the record store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// One synchronization pass against the remote authority.
///
/// May take a long time; may fail. Idempotent to retry. The wire
/// protocol, its cryptography, and conflict resolution are opaque here.
#[async_trait]
pub trait SyncEngine: Send + Sync {
    /// Attempt one synchronization pass.
    async fn sync(&self) -> Result<(), EngineError>;
}

/// Read access to every currently-known record.
///
/// Assumed fast and safe for concurrent reads; never coalesced.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Return every record the store currently knows.
    async fn read_all(&self) -> Result<Vec<TaskRecord>, StoreError>;
}
