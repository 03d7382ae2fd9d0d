//! Sync coordinator
//!
//! Decides, on each report request, whether to invoke the sync engine.
//! Concurrent callers are coalesced into a single in-flight attempt, a
//! min-interval gate suppresses redundant engine calls after a success,
//! and every attempt is bounded by a timeout. No path returns an error:
//! every caller receives a [`SyncMeta`] describing what happened and then
//! reads whatever is currently in the store.
//!
//! The snapshot state (last successful sync, last outcome, in-flight
//! marker) is the only mutable shared resource here. It lives in one
//! mutex owned by this coordinator; nothing outside it mutates it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tasklens_domain::{SyncMeta, SyncOutcome};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::sync::ports::SyncEngine;

/// Timing policy for sync attempts.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    /// Minimum interval between engine calls after a success.
    pub min_interval: Duration,
    /// Upper bound on a single engine call.
    pub sync_timeout: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self { min_interval: Duration::from_secs(10), sync_timeout: Duration::from_secs(30) }
    }
}

type OutcomeReceiver = watch::Receiver<Option<SyncOutcome>>;

/// The process's only memory of synchronization history. In-memory only;
/// resets to "never synced" on restart.
#[derive(Default)]
struct SnapshotState {
    /// Last successful sync, for response metadata. Only advances.
    last_sync_at: Option<DateTime<Utc>>,
    /// Monotonic twin of `last_sync_at`, used for the min-interval gate.
    last_success_at: Option<Instant>,
    /// Outcome of the most recent completed attempt.
    last_outcome: Option<SyncOutcome>,
    /// Receiver for the attempt currently running, if any.
    in_flight: Option<OutcomeReceiver>,
}

impl SnapshotState {
    /// True when the last attempt succeeded recently enough to skip the
    /// engine entirely.
    fn is_fresh(&self, min_interval: Duration) -> bool {
        let succeeded = self.last_outcome.as_ref().is_some_and(|outcome| outcome.success);
        succeeded && self.last_success_at.is_some_and(|at| at.elapsed() < min_interval)
    }
}

/// Coalesces report-triggered sync requests into single-flight attempts.
pub struct SyncCoordinator {
    engine: Arc<dyn SyncEngine>,
    policy: SyncPolicy,
    state: Arc<Mutex<SnapshotState>>,
}

impl SyncCoordinator {
    /// Create a coordinator that owns its snapshot state.
    pub fn new(engine: Arc<dyn SyncEngine>, policy: SyncPolicy) -> Self {
        Self { engine, policy, state: Arc::new(Mutex::new(SnapshotState::default())) }
    }

    /// Freshen the replica if warranted, else report on what we have.
    ///
    /// Policy, in order:
    /// 1. If the last attempt succeeded within `min_interval`, skip the
    ///    engine and report fresh data.
    /// 2. If an attempt is already in flight, attach to it instead of
    ///    starting another; exactly one engine call exists at any time.
    /// 3. Otherwise start a new attempt, bounded by the sync timeout.
    ///
    /// The caller waits at most `wait_budget`; a caller that stops
    /// waiting does not cancel the attempt for anyone else. The attempt
    /// updates the snapshot whenever it completes, whether or not any
    /// caller is still listening.
    pub async fn ensure_fresh_enough(&self, wait_budget: Duration) -> SyncMeta {
        let wait_started = Instant::now();

        // The gate and the in-flight check happen under one lock
        // acquisition, so a sync completed by another caller while this
        // one queued for the lock is observed here.
        let mut rx = {
            let mut state = self.state.lock().await;
            if state.is_fresh(self.policy.min_interval) {
                debug!("Skipping sync: min interval not elapsed since last success");
                return SyncMeta {
                    sync_ok: true,
                    stale: false,
                    last_sync_at: state.last_sync_at,
                    duration_ms: 0,
                };
            }
            // A receiver whose sender is gone marks an attempt that died
            // without publishing; replace it instead of attaching.
            let live = state.in_flight.as_ref().filter(|rx| rx.has_changed().is_ok()).cloned();
            if let Some(rx) = live {
                debug!("Attaching to in-flight sync attempt");
                rx
            } else {
                if state.in_flight.is_some() {
                    warn!("Previous sync attempt died without an outcome; starting a new one");
                }
                let (tx, rx) = watch::channel(None);
                state.in_flight = Some(rx.clone());
                self.spawn_attempt(tx);
                rx
            }
        };

        // The watch guard returned by `wait_for` must not live past this
        // statement: the state lock below is another await point.
        let sync_ok =
            match tokio::time::timeout(wait_budget, rx.wait_for(|outcome| outcome.is_some())).await
            {
                Ok(Ok(outcome)) => outcome.as_ref().is_some_and(|o| o.success),
                Ok(Err(_)) => {
                    // Sender dropped without publishing (attempt task died).
                    warn!("Sync attempt ended without an outcome");
                    false
                }
                Err(_) => {
                    debug!(
                        waited_ms = elapsed_ms(wait_started),
                        "Stopped waiting for in-flight sync attempt"
                    );
                    false
                }
            };
        let duration_ms = elapsed_ms(wait_started);

        let state = self.state.lock().await;
        SyncMeta { sync_ok, stale: !sync_ok, last_sync_at: state.last_sync_at, duration_ms }
    }

    /// Last successful sync, for liveness checks and response metadata.
    /// Never touches the engine.
    pub async fn last_known_sync(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_sync_at
    }

    /// Spawn the attempt task. It runs to its own completion or timeout
    /// independently of any caller's deadline, updates the snapshot, and
    /// publishes the outcome exactly once.
    fn spawn_attempt(&self, tx: watch::Sender<Option<SyncOutcome>>) {
        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        let sync_timeout = self.policy.sync_timeout;

        tokio::spawn(async move {
            let started_at = Utc::now();
            let attempt_started = Instant::now();
            info!("Starting sync attempt");

            let outcome = match tokio::time::timeout(sync_timeout, engine.sync()).await {
                Ok(Ok(())) => {
                    let duration_ms = elapsed_ms(attempt_started);
                    info!(duration_ms, "Sync succeeded");
                    SyncOutcome { success: true, started_at, duration_ms, error: None }
                }
                Ok(Err(err)) => {
                    let duration_ms = elapsed_ms(attempt_started);
                    warn!(duration_ms, error = %err, "Sync failed");
                    SyncOutcome {
                        success: false,
                        started_at,
                        duration_ms,
                        error: Some(err.to_string()),
                    }
                }
                Err(_) => {
                    let duration_ms = elapsed_ms(attempt_started);
                    warn!(duration_ms, "Sync attempt timed out");
                    SyncOutcome {
                        success: false,
                        started_at,
                        duration_ms,
                        error: Some(format!("timed out after {}s", sync_timeout.as_secs())),
                    }
                }
            };

            {
                let mut state = state.lock().await;
                if outcome.success {
                    state.last_sync_at = Some(Utc::now());
                    state.last_success_at = Some(Instant::now());
                }
                state.last_outcome = Some(outcome.clone());
                state.in_flight = None;
            }

            // Every caller may already have stopped waiting; that's fine.
            let _ = tx.send(Some(outcome));
        });
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
