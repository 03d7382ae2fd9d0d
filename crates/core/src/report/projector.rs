//! Report projector
//!
//! Pure transform from raw stored records to the client-facing overview
//! list. Three steps, no side effects beyond logging skipped records:
//! normalize (parse timestamps, derive display fields, render in the
//! display timezone), filter (data-driven predicate), sort (composite
//! key with a total, reproducible order).

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tasklens_domain::{
    short_id, OverviewMeta, OverviewTask, ReportConfig, Result, SortField, SyncMeta, TaskRecord,
    TaskStatus, TaskTimestamps,
};
use tracing::warn;

use crate::report::timestamp::{parse_instant, render_in_zone};

/// Predicate applied to normalized tasks. Data, not code, so deployments
/// compose predicates through configuration alone.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    /// Status a task must have to survive.
    pub status: TaskStatus,
    /// Tag whose presence excludes a task, if set.
    pub exclude_tag: Option<String>,
}

impl ReportFilter {
    fn matches(&self, task: &OverviewTask) -> bool {
        if task.status != self.status {
            return false;
        }
        match &self.exclude_tag {
            Some(tag) => !task.tags.iter().any(|t| t == tag),
            None => true,
        }
    }
}

/// Process-wide projection settings; never varied per request.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub filter: ReportFilter,
    /// Primary sort key.
    pub sort_field: SortField,
    /// Timezone timestamps are rendered in.
    pub timezone: Tz,
}

impl ReportSettings {
    /// Build settings from the report section of the configuration.
    ///
    /// # Errors
    /// Returns `TaskLensError::Config` when the timezone name is unknown.
    pub fn from_config(report: &ReportConfig) -> Result<Self> {
        Ok(Self {
            filter: ReportFilter {
                status: report.status,
                exclude_tag: report.exclude_tag.clone(),
            },
            sort_field: report.sort_field,
            timezone: report.display_timezone()?,
        })
    }
}

/// Projection output: the ordered tasks plus how many records failed
/// normalization and were excluded.
#[derive(Debug, Clone)]
pub struct Projection {
    pub tasks: Vec<OverviewTask>,
    pub skipped: usize,
}

/// Normalized task plus the keys sorting needs in their parsed form.
/// Rendered strings cannot be compared across DST boundaries.
struct Row {
    primary: Option<String>,
    entry: DateTime<Utc>,
    task: OverviewTask,
}

/// Project raw records into the filtered, sorted overview list.
///
/// Deterministic: an unchanged record set yields byte-identical output,
/// tie-breaks included. An empty record set projects to an empty list.
/// Records with malformed timestamps are excluded and counted, never
/// fatal.
pub fn project(records: &[TaskRecord], settings: &ReportSettings) -> Projection {
    let mut skipped = 0_usize;
    let mut rows: Vec<Row> = Vec::with_capacity(records.len());

    for record in records {
        let Some((task, entry)) = normalize(record, settings.timezone) else {
            warn!(uuid = %record.uuid, "Skipping record with malformed timestamp");
            skipped = skipped.saturating_add(1);
            continue;
        };
        if !settings.filter.matches(&task) {
            continue;
        }
        let primary = match settings.sort_field {
            SortField::Project => task.project.clone(),
            SortField::TagSignature => Some(task.tags_sort_key.clone()),
        };
        rows.push(Row { primary, entry, task });
    }

    // Missing primary key sorts first (Option ordering), then byte-order
    // ascending; entry instant, then uuid, guarantee a total order.
    rows.sort_by(|a, b| {
        a.primary
            .cmp(&b.primary)
            .then_with(|| a.entry.cmp(&b.entry))
            .then_with(|| a.task.uuid.cmp(&b.task.uuid))
    });

    Projection { tasks: rows.into_iter().map(|row| row.task).collect(), skipped }
}

/// Render coordinator metadata for an HTTP response.
pub fn render_meta(meta: &SyncMeta, tz: Tz) -> OverviewMeta {
    OverviewMeta {
        sync_ok: meta.sync_ok,
        stale: meta.stale,
        last_sync_at: meta.last_sync_at.map(|at| render_in_zone(at, tz)),
        duration_ms: meta.duration_ms,
    }
}

/// Map one record to its display form. Returns `None` when any present
/// timestamp fails to parse.
fn normalize(record: &TaskRecord, tz: Tz) -> Option<(OverviewTask, DateTime<Utc>)> {
    let entry = parse_instant(&record.entry)?;
    let modified = parse_instant(&record.modified)?;
    let scheduled = parse_present(record.scheduled.as_deref())?;
    let start = parse_present(record.start.as_deref())?;
    let wait = parse_present(record.wait.as_deref())?;

    let mut sorted_tags = record.tags.clone();
    sorted_tags.sort();

    let task = OverviewTask {
        uuid: record.uuid,
        short_id: short_id(&record.uuid),
        description: record.description.clone(),
        status: record.status,
        project: record.project.clone(),
        tags: record.tags.clone(),
        tags_sort_key: sorted_tags.join(","),
        active: start.is_some(),
        timestamps: TaskTimestamps {
            entry: render_in_zone(entry, tz),
            modified: render_in_zone(modified, tz),
            scheduled: scheduled.map(|at| render_in_zone(at, tz)),
            start: start.map(|at| render_in_zone(at, tz)),
            wait: wait.map(|at| render_in_zone(at, tz)),
        },
    };
    Some((task, entry))
}

/// Absent stays absent; present-but-malformed fails normalization.
fn parse_present(raw: Option<&str>) -> Option<Option<DateTime<Utc>>> {
    match raw {
        None => Some(None),
        Some(value) => parse_instant(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use tasklens_domain::TaskStatus;
    use uuid::Uuid;

    use super::*;

    fn record(uuid: &str, status: TaskStatus, project: Option<&str>, entry: &str) -> TaskRecord {
        TaskRecord {
            uuid: Uuid::parse_str(uuid).expect("valid uuid"),
            description: format!("task {uuid}"),
            status,
            project: project.map(str::to_string),
            tags: Vec::new(),
            entry: entry.to_string(),
            modified: entry.to_string(),
            scheduled: None,
            start: None,
            wait: None,
        }
    }

    fn settings() -> ReportSettings {
        ReportSettings {
            filter: ReportFilter { status: TaskStatus::Pending, exclude_tag: None },
            sort_field: SortField::Project,
            timezone: chrono_tz::Europe::Zurich,
        }
    }

    const UUID_A: &str = "aaaaaaaa-0000-0000-0000-000000000001";
    const UUID_B: &str = "bbbbbbbb-0000-0000-0000-000000000002";
    const UUID_C: &str = "cccccccc-0000-0000-0000-000000000003";

    #[test]
    fn filters_by_status_and_sorts_by_project_then_entry() {
        let records = vec![
            record(UUID_A, TaskStatus::Pending, Some("b"), "20240301T100000Z"),
            record(UUID_B, TaskStatus::Pending, Some("a"), "20240301T090000Z"),
            record(UUID_C, TaskStatus::Completed, Some("a"), "20240301T110000Z"),
        ];

        let projection = project(&records, &settings());
        assert_eq!(projection.skipped, 0);
        let short_ids: Vec<&str> =
            projection.tasks.iter().map(|t| t.short_id.as_str()).collect();
        assert_eq!(short_ids, vec!["bbbbbbbb", "aaaaaaaa"], "project 'a' before 'b'");
    }

    #[test]
    fn identical_keys_tie_break_on_identifier() {
        let records = vec![
            record(UUID_B, TaskStatus::Pending, Some("a"), "20240301T090000Z"),
            record(UUID_A, TaskStatus::Pending, Some("a"), "20240301T090000Z"),
        ];

        let projection = project(&records, &settings());
        let uuids: Vec<String> = projection.tasks.iter().map(|t| t.uuid.to_string()).collect();
        assert_eq!(uuids, vec![UUID_A, UUID_B]);
    }

    #[test]
    fn missing_project_sorts_first() {
        let records = vec![
            record(UUID_A, TaskStatus::Pending, Some("a"), "20240301T090000Z"),
            record(UUID_B, TaskStatus::Pending, None, "20240301T100000Z"),
        ];

        let projection = project(&records, &settings());
        assert_eq!(projection.tasks[0].uuid.to_string(), UUID_B);
    }

    #[test]
    fn excluded_tag_drops_task_without_touching_others() {
        let mut tagged = record(UUID_A, TaskStatus::Pending, Some("a"), "20240301T090000Z");
        tagged.tags = vec!["someday".to_string()];
        let kept = record(UUID_B, TaskStatus::Pending, Some("b"), "20240301T100000Z");
        let records = vec![tagged, kept];

        let projection = project(&records, &settings());
        assert_eq!(projection.tasks.len(), 2, "no exclude tag configured keeps both");
        let kept_fields = projection.tasks[1].clone();

        let mut configured = settings();
        configured.filter.exclude_tag = Some("someday".to_string());
        let projection = project(&records, &configured);
        assert_eq!(projection.tasks.len(), 1);
        assert_eq!(projection.tasks[0], kept_fields, "survivor fields and order untouched");
    }

    #[test]
    fn tag_signature_sorting_uses_sorted_tags() {
        let mut first = record(UUID_A, TaskStatus::Pending, None, "20240301T090000Z");
        first.tags = vec!["zeta".to_string(), "alpha".to_string()];
        let mut second = record(UUID_B, TaskStatus::Pending, None, "20240301T090000Z");
        second.tags = vec!["beta".to_string()];

        let mut configured = settings();
        configured.sort_field = SortField::TagSignature;

        let projection = project(&[first, second], &configured);
        assert_eq!(projection.tasks[0].tags_sort_key, "alpha,zeta");
        assert_eq!(projection.tasks[1].tags_sort_key, "beta");
    }

    #[test]
    fn malformed_timestamp_is_skipped_and_counted() {
        let good = record(UUID_A, TaskStatus::Pending, Some("a"), "20240301T090000Z");
        let mut bad = record(UUID_B, TaskStatus::Pending, Some("a"), "yesterday-ish");
        bad.description = "unparseable".to_string();

        let projection = project(&[good, bad], &settings());
        assert_eq!(projection.tasks.len(), 1);
        assert_eq!(projection.skipped, 1);
    }

    #[test]
    fn present_but_malformed_optional_timestamp_is_a_skip() {
        let mut bad = record(UUID_A, TaskStatus::Pending, Some("a"), "20240301T090000Z");
        bad.scheduled = Some("not-a-date".to_string());

        let projection = project(&[bad], &settings());
        assert!(projection.tasks.is_empty());
        assert_eq!(projection.skipped, 1);
    }

    #[test]
    fn start_timestamp_drives_active_flag_and_nulls_are_preserved() {
        let mut started = record(UUID_A, TaskStatus::Pending, None, "20240301T090000Z");
        started.start = Some("20240301T100000Z".to_string());

        let projection = project(&[started], &settings());
        let task = &projection.tasks[0];
        assert!(task.active);
        assert!(task.timestamps.start.is_some());
        assert!(task.timestamps.scheduled.is_none(), "absent stays absent, not omitted");
    }

    #[test]
    fn projection_is_deterministic() {
        let records = vec![
            record(UUID_C, TaskStatus::Pending, Some("a"), "20240301T090000Z"),
            record(UUID_A, TaskStatus::Pending, Some("a"), "20240301T090000Z"),
            record(UUID_B, TaskStatus::Pending, None, "20240301T080000Z"),
        ];

        let first = project(&records, &settings());
        let second = project(&records, &settings());
        assert_eq!(first.tasks, second.tasks);
    }

    #[test]
    fn empty_input_projects_to_empty_output() {
        let projection = project(&[], &settings());
        assert!(projection.tasks.is_empty());
        assert_eq!(projection.skipped, 0);
    }
}
