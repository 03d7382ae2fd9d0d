//! Shared application state handed to every request handler.

use std::sync::Arc;
use std::time::Duration;

use tasklens_core::{ReportSettings, SyncCoordinator, TaskStore};

/// Everything a handler needs; cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Owns all sync bookkeeping; the only writer of snapshot state.
    pub coordinator: Arc<SyncCoordinator>,
    /// Record store read on every report request; never coalesced.
    pub store: Arc<dyn TaskStore>,
    /// Process-wide filter, sort, and timezone settings.
    pub settings: Arc<ReportSettings>,
    /// Bearer token required on report requests; `None` disables auth.
    pub auth_secret: Option<String>,
    /// How long a report request waits for a sync attempt.
    pub wait_budget: Duration,
}
