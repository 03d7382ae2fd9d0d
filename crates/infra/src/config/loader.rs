//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Starts from built-in defaults
//! 2. Merges a config file if one is found (JSON or TOML)
//! 3. Applies environment variable overrides on top
//! 4. Validates the result; a misconfigured process never starts
//!
//! ## Environment Variables
//! - `TASKLENS_BIND_ADDR`: HTTP bind address
//! - `TASKLENS_AUTH_SECRET`: bearer token for report requests
//! - `TASKLENS_SYNC_TIMEOUT_SECONDS`: sync attempt timeout
//! - `TASKLENS_MIN_SYNC_INTERVAL_SECONDS`: minimum interval between syncs
//! - `TASKLENS_TASK_BIN`: Taskwarrior binary to invoke
//! - `TASKLENS_TASK_DATA`: `TASKDATA` override for the binary
//! - `TASKLENS_TASKRC`: `TASKRC` override for the binary
//! - `TASKLENS_SYNC_RETRY_ATTEMPTS`: attempts for a transiently failing sync
//! - `TASKLENS_SYNC_RETRY_DELAY_SECONDS`: delay between sync retries
//! - `TASKLENS_REPORT_STATUS`: status filter (pending, completed, ...)
//! - `TASKLENS_REPORT_EXCLUDE_TAG`: excluded tag; empty value disables
//! - `TASKLENS_REPORT_SORT_FIELD`: `project` or `tag-signature`
//! - `TASKLENS_REPORT_TIMEZONE`: IANA display timezone
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./tasklens.json` or `./tasklens.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories

use std::path::{Path, PathBuf};

use tasklens_domain::{Config, Result, SortField, TaskLensError, TaskStatus};
use tracing::{debug, info};

/// Load configuration with the default strategy, then validate it.
///
/// # Errors
/// Returns `TaskLensError::Config` if a found file is malformed, an
/// environment override has an invalid value, or validation fails.
pub fn load() -> Result<Config> {
    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            debug!("No config file found, starting from defaults");
            Config::default()
        }
    };
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML, detected by file extension.
///
/// # Errors
/// Returns `TaskLensError::Config` if the file is missing, no file is
/// found while probing, or the contents fail to parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaskLensError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaskLensError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    info!(path = %config_path.display(), "Loading configuration file");
    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        TaskLensError::Config(format!("Failed to read {}: {e}", config_path.display()))
    })?;

    match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .map_err(|e| TaskLensError::Config(format!("Invalid JSON config: {e}"))),
        Some("toml") => toml::from_str(&contents)
            .map_err(|e| TaskLensError::Config(format!("Invalid TOML config: {e}"))),
        other => Err(TaskLensError::Config(format!(
            "Unsupported config extension: {}",
            other.unwrap_or("<none>")
        ))),
    }
}

/// Probe the standard locations for a config file.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "tasklens.json", "tasklens.toml"];
    const DIRS: [&str; 3] = [".", "..", "../.."];

    for dir in DIRS {
        for name in NAMES {
            let candidate = Path::new(dir).join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Apply `TASKLENS_*` environment overrides on top of the loaded values.
fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(value) = std::env::var("TASKLENS_BIND_ADDR") {
        config.server.bind_addr = value;
    }
    if let Ok(value) = std::env::var("TASKLENS_AUTH_SECRET") {
        config.server.auth_secret = Some(value);
    }
    if let Some(value) = env_u64("TASKLENS_SYNC_TIMEOUT_SECONDS")? {
        config.sync.timeout_seconds = value;
    }
    if let Some(value) = env_u64("TASKLENS_MIN_SYNC_INTERVAL_SECONDS")? {
        config.sync.min_interval_seconds = value;
    }
    if let Ok(value) = std::env::var("TASKLENS_TASK_BIN") {
        config.taskwarrior.task_bin = value;
    }
    if let Ok(value) = std::env::var("TASKLENS_TASK_DATA") {
        config.taskwarrior.task_data = Some(value);
    }
    if let Ok(value) = std::env::var("TASKLENS_TASKRC") {
        config.taskwarrior.taskrc = Some(value);
    }
    if let Some(value) = env_u64("TASKLENS_SYNC_RETRY_ATTEMPTS")? {
        config.taskwarrior.retry_attempts =
            u32::try_from(value).map_err(|_| invalid("TASKLENS_SYNC_RETRY_ATTEMPTS"))?;
    }
    if let Some(value) = env_u64("TASKLENS_SYNC_RETRY_DELAY_SECONDS")? {
        config.taskwarrior.retry_delay_seconds = value;
    }
    if let Ok(value) = std::env::var("TASKLENS_REPORT_STATUS") {
        config.report.status = parse_status(&value)?;
    }
    if let Ok(value) = std::env::var("TASKLENS_REPORT_EXCLUDE_TAG") {
        config.report.exclude_tag = if value.is_empty() { None } else { Some(value) };
    }
    if let Ok(value) = std::env::var("TASKLENS_REPORT_SORT_FIELD") {
        config.report.sort_field = parse_sort_field(&value)?;
    }
    if let Ok(value) = std::env::var("TASKLENS_REPORT_TIMEZONE") {
        config.report.timezone = value;
    }
    Ok(())
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|e| TaskLensError::Config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn invalid(name: &str) -> TaskLensError {
    TaskLensError::Config(format!("Invalid {name}: out of range"))
}

fn parse_status(value: &str) -> Result<TaskStatus> {
    match value.to_ascii_lowercase().as_str() {
        "pending" => Ok(TaskStatus::Pending),
        "completed" => Ok(TaskStatus::Completed),
        "deleted" => Ok(TaskStatus::Deleted),
        "recurring" => Ok(TaskStatus::Recurring),
        "waiting" => Ok(TaskStatus::Waiting),
        other => Err(TaskLensError::Config(format!("Unknown report status: {other}"))),
    }
}

fn parse_sort_field(value: &str) -> Result<SortField> {
    match value.to_ascii_lowercase().as_str() {
        "project" => Ok(SortField::Project),
        "tag-signature" | "tags" => Ok(SortField::TagSignature),
        other => Err(TaskLensError::Config(format!("Unknown sort field: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    // Environment variables are process-global; serialize the tests that
    // touch them.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const OVERRIDE_VARS: [&str; 5] = [
        "TASKLENS_BIND_ADDR",
        "TASKLENS_SYNC_TIMEOUT_SECONDS",
        "TASKLENS_REPORT_SORT_FIELD",
        "TASKLENS_REPORT_EXCLUDE_TAG",
        "TASKLENS_REPORT_STATUS",
    ];

    fn clear_overrides() {
        for name in OVERRIDE_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasklens.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            bind_addr = "0.0.0.0:9000"

            [sync]
            timeout_seconds = 7
            "#,
        )
        .expect("write config");

        let config = load_from_file(Some(path)).expect("load");
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.sync.timeout_seconds, 7);
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"report": {"timezone": "UTC"}}"#).expect("write config");

        let config = load_from_file(Some(path)).expect("load");
        assert_eq!(config.report.timezone, "UTC");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/tasklens.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn env_overrides_take_precedence() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        clear_overrides();
        std::env::set_var("TASKLENS_BIND_ADDR", "127.0.0.1:9999");
        std::env::set_var("TASKLENS_SYNC_TIMEOUT_SECONDS", "3");
        std::env::set_var("TASKLENS_REPORT_SORT_FIELD", "tag-signature");
        std::env::set_var("TASKLENS_REPORT_EXCLUDE_TAG", "");

        let mut config = Config::default();
        apply_env_overrides(&mut config).expect("overrides");
        clear_overrides();

        assert_eq!(config.server.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.sync.timeout_seconds, 3);
        assert_eq!(config.report.sort_field, SortField::TagSignature);
        assert_eq!(config.report.exclude_tag, None, "empty value disables the tag filter");
    }

    #[test]
    fn invalid_env_number_is_an_error() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        clear_overrides();
        std::env::set_var("TASKLENS_SYNC_TIMEOUT_SECONDS", "soon");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        clear_overrides();

        assert!(result.is_err());
    }

    #[test]
    fn unknown_status_override_is_an_error() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        clear_overrides();
        std::env::set_var("TASKLENS_REPORT_STATUS", "snoozed");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        clear_overrides();

        assert!(result.is_err());
    }
}
