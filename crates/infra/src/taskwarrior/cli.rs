//! Taskwarrior CLI adapter
//!
//! Implements both core ports by invoking the external `task` binary:
//! `task sync` for the sync-engine port and `task export` for the
//! record-store port. The sync wire protocol, its encryption, and the
//! replica's durability all stay inside that binary; this adapter only
//! launches it, classifies its failures, and parses its export payload.
//!
//! Transient sync failures are retried a configurable number of times
//! with a fixed delay, matching how the upstream sync server behaves
//! under load. Credential-bearing configuration (`TASKRC` contents)
//! never appears in logs or errors.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tasklens_core::{EngineError, StoreError, SyncEngine, TaskStore};
use tasklens_domain::{TaskRecord, TaskwarriorConfig};
use tokio::process::Command;
use tracing::{debug, warn};

/// Cap on how much stderr is carried into a classified error.
const STDERR_SNIPPET_LEN: usize = 300;

/// Adapter over the external Taskwarrior binary.
pub struct TaskwarriorCli {
    config: TaskwarriorConfig,
}

impl TaskwarriorCli {
    /// Create an adapter for the configured binary.
    pub fn new(config: TaskwarriorConfig) -> Self {
        Self { config }
    }

    /// Base command with hooks and prompts disabled and the configured
    /// data/rc overrides applied.
    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.config.task_bin);
        cmd.arg("rc.confirmation=off");
        cmd.arg("rc.hooks=off");
        cmd.arg(subcommand);
        if let Some(dir) = &self.config.task_data {
            cmd.env("TASKDATA", dir);
        }
        if let Some(rc) = &self.config.taskrc {
            cmd.env("TASKRC", rc);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // If the coordinator abandons the attempt, the child goes with it.
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run_sync_once(&self) -> Result<(), EngineError> {
        let output = self
            .command("sync")
            .output()
            .await
            .map_err(|e| EngineError::Other(format!("Failed to launch task binary: {e}")))?;

        if output.status.success() {
            return Ok(());
        }
        Err(classify_sync_error(&String::from_utf8_lossy(&output.stderr)))
    }
}

#[async_trait]
impl SyncEngine for TaskwarriorCli {
    async fn sync(&self) -> Result<(), EngineError> {
        let attempts = self.config.retry_attempts.max(1);
        let delay = Duration::from_secs(self.config.retry_delay_seconds);
        let mut last_error = EngineError::Other("sync was never attempted".to_string());

        for attempt in 1..=attempts {
            debug!(attempt, attempts, "Running task sync");
            match self.run_sync_once().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    let retryable = is_transient(&err) && attempt < attempts;
                    if retryable {
                        warn!(attempt, error = %err, "Sync attempt failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}

#[async_trait]
impl TaskStore for TaskwarriorCli {
    async fn read_all(&self) -> Result<Vec<TaskRecord>, StoreError> {
        let output = self
            .command("export")
            .output()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to launch task binary: {e}")))?;

        if !output.status.success() {
            return Err(StoreError::Unavailable(format!(
                "task export exited with {}: {}",
                output.status,
                snippet(&String::from_utf8_lossy(&output.stderr)),
            )));
        }
        parse_export(&output.stdout)
    }
}

/// Parse a `task export` payload into records.
///
/// Rows that fail to deserialize are skipped with a warning; a payload
/// that is not a JSON array at all means the store read failed.
///
/// # Errors
/// Returns `StoreError::Unavailable` for a malformed payload.
pub fn parse_export(raw: &[u8]) -> Result<Vec<TaskRecord>, StoreError> {
    let rows: Vec<serde_json::Value> = serde_json::from_slice(raw)
        .map_err(|e| StoreError::Unavailable(format!("Malformed export payload: {e}")))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<TaskRecord>(row) {
            Ok(record) => records.push(record),
            Err(err) => warn!(error = %err, "Skipping unparseable export row"),
        }
    }
    Ok(records)
}

/// Map `task sync` stderr onto the engine error taxonomy.
fn classify_sync_error(stderr: &str) -> EngineError {
    let lowered = stderr.to_ascii_lowercase();
    let message = snippet(stderr);

    if ["could not connect", "connection", "unreachable", "network", "timed out", "name or service"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        EngineError::Unreachable(message)
    } else if ["denied", "authentication", "unauthorized", "forbidden", "client id"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        EngineError::AuthRejected(message)
    } else if lowered.contains("decrypt") || lowered.contains("encryption secret") {
        EngineError::DecryptionFailed(message)
    } else {
        EngineError::Other(message)
    }
}

/// Retry connectivity-shaped failures; a rejected credential or a bad
/// secret will not fix itself between attempts.
fn is_transient(err: &EngineError) -> bool {
    matches!(err, EngineError::Unreachable(_) | EngineError::Other(_))
}

fn snippet(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let mut out: String = trimmed.chars().take(STDERR_SNIPPET_LEN).collect();
    if trimmed.chars().count() > STDERR_SNIPPET_LEN {
        out.push_str("...");
    }
    out
}
