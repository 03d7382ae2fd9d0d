//! Common data types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SHORT_ID_LEN;

/// Lifecycle status of a task as stored in the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Deleted,
    Recurring,
    Waiting,
    /// Any status value this version does not recognize.
    #[serde(other)]
    Unknown,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Raw task row as read from the record store.
///
/// Timestamps stay in the store's string encoding (compact Taskwarrior,
/// decimal epoch, or ISO 8601) until projection normalizes them. Unknown
/// store fields are ignored on deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub uuid: Uuid,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub entry: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub scheduled: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub wait: Option<String>,
}

/// Timestamp block of a projected task, rendered in the display timezone.
///
/// Optional fields serialize as explicit `null`, never as omitted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTimestamps {
    /// Creation timestamp (ISO 8601, display timezone).
    pub entry: String,
    /// Last-modified timestamp (ISO 8601, display timezone).
    pub modified: String,
    /// Scheduled timestamp or `null`.
    pub scheduled: Option<String>,
    /// Start timestamp or `null`.
    pub start: Option<String>,
    /// Wait timestamp or `null`.
    pub wait: Option<String>,
}

/// Display-ready form of a stored task. Created fresh on every projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewTask {
    /// Primary identifier.
    pub uuid: Uuid,
    /// Fixed-length identifier prefix for display.
    pub short_id: String,
    pub description: String,
    pub status: TaskStatus,
    pub project: Option<String>,
    pub tags: Vec<String>,
    /// Deterministic sort key: comma-joined sorted tags.
    pub tags_sort_key: String,
    /// True iff the task has a start timestamp.
    pub active: bool,
    pub timestamps: TaskTimestamps,
}

/// Derive the display short id from a full identifier.
pub fn short_id(uuid: &Uuid) -> String {
    let mut id = uuid.to_string();
    id.truncate(SHORT_ID_LEN);
    id
}

/// Result of one completed (or timed-out) sync attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the attempt reconciled the replica with the remote.
    pub success: bool,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u64,
    /// Classified error rendered for diagnostics; never shown to clients.
    pub error: Option<String>,
}

/// What the coordinator tells each caller about the freshness of the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMeta {
    /// Whether the most recent attempt (or skip) left the data trusted.
    pub sync_ok: bool,
    /// True when the served data was not refreshed by the latest attempt.
    pub stale: bool,
    /// Last *successful* sync; never rewound by failures.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// This caller's wall-clock wait, bounded by the sync timeout.
    pub duration_ms: u64,
}

/// Sync metadata as rendered in HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewMeta {
    pub sync_ok: bool,
    pub stale: bool,
    /// Last successful sync (ISO 8601, display timezone) or `null`.
    pub last_sync_at: Option<String>,
    pub duration_ms: u64,
}

/// Response body for the overview report endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewResponse {
    pub meta: OverviewMeta,
    pub tasks: Vec<OverviewTask>,
}

/// Response body for the liveness endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Last successful sync (ISO 8601, display timezone) or `null`.
    pub last_sync_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_deserializes_lowercase_and_unknown() {
        let status: TaskStatus = serde_json::from_str("\"pending\"").expect("valid status");
        assert_eq!(status, TaskStatus::Pending);

        let status: TaskStatus = serde_json::from_str("\"frobnicated\"").expect("valid json");
        assert_eq!(status, TaskStatus::Unknown);
    }

    #[test]
    fn short_id_is_uuid_prefix() {
        let uuid = Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").expect("valid uuid");
        assert_eq!(short_id(&uuid), "a1b2c3d4");
    }

    #[test]
    fn record_deserializes_from_export_row() {
        let row = serde_json::json!({
            "uuid": "11111111-2222-3333-4444-555555555555",
            "description": "water the plants",
            "status": "pending",
            "project": "home",
            "tags": ["garden"],
            "entry": "20240301T080000Z",
            "modified": "20240301T090000Z",
            "urgency": 4.2
        });
        let record: TaskRecord = serde_json::from_value(row).expect("valid record");
        assert_eq!(record.status, TaskStatus::Pending);
        assert_eq!(record.project.as_deref(), Some("home"));
        assert!(record.start.is_none());
    }

    #[test]
    fn null_timestamps_serialize_as_explicit_null() {
        let timestamps = TaskTimestamps {
            entry: "2024-03-01T09:00:00+01:00".to_string(),
            modified: "2024-03-01T10:00:00+01:00".to_string(),
            scheduled: None,
            start: None,
            wait: None,
        };
        let value = serde_json::to_value(&timestamps).expect("serializable");
        let object = value.as_object().expect("object");
        assert!(object.contains_key("scheduled"));
        assert!(object["scheduled"].is_null());
        assert!(object["wait"].is_null());
    }
}
