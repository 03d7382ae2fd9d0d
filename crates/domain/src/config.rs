//! Configuration structures
//!
//! All sections carry defaults so a config file only needs to override
//! what differs from a stock deployment. Validation happens once at
//! startup; a misconfigured process never starts serving.

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_DISPLAY_TIMEZONE, DEFAULT_MIN_SYNC_INTERVAL_SECONDS,
    DEFAULT_SYNC_RETRY_ATTEMPTS, DEFAULT_SYNC_RETRY_DELAY_SECONDS, DEFAULT_SYNC_TIMEOUT_SECONDS,
    DEFAULT_TASK_BIN, TAG_SOMEDAY,
};
use crate::errors::{Result, TaskLensError};
use crate::types::TaskStatus;

/// Primary sort key for the overview report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    /// Sort by project label; tasks without a project sort first.
    Project,
    /// Sort by the comma-joined sorted tag list.
    TagSignature,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub taskwarrior: TaskwarriorConfig,
    pub report: ReportConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub bind_addr: String,
    /// Bearer token required on report requests; `None` disables auth.
    pub auth_secret: Option<String>,
}

/// Sync policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on a single sync attempt, in seconds.
    pub timeout_seconds: u64,
    /// Minimum interval between engine calls after a success, in seconds.
    pub min_interval_seconds: u64,
}

/// Settings for the external Taskwarrior binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskwarriorConfig {
    /// Binary invoked for sync and export.
    pub task_bin: String,
    /// Overrides `TASKDATA` for the invoked binary.
    pub task_data: Option<String>,
    /// Overrides `TASKRC` for the invoked binary.
    pub taskrc: Option<String>,
    /// Attempts for a transiently failing sync.
    pub retry_attempts: u32,
    /// Delay between sync retries, in seconds.
    pub retry_delay_seconds: u64,
}

/// Filter, sort, and rendering settings for the overview report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Status a task must have to appear in the report.
    pub status: TaskStatus,
    /// Tag that excludes a task from the report, if set.
    pub exclude_tag: Option<String>,
    /// Primary sort key.
    pub sort_field: SortField,
    /// IANA timezone name used to render timestamps.
    pub timezone: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string(), auth_secret: None }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_SYNC_TIMEOUT_SECONDS,
            min_interval_seconds: DEFAULT_MIN_SYNC_INTERVAL_SECONDS,
        }
    }
}

impl Default for TaskwarriorConfig {
    fn default() -> Self {
        Self {
            task_bin: DEFAULT_TASK_BIN.to_string(),
            task_data: None,
            taskrc: None,
            retry_attempts: DEFAULT_SYNC_RETRY_ATTEMPTS,
            retry_delay_seconds: DEFAULT_SYNC_RETRY_DELAY_SECONDS,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            status: TaskStatus::Pending,
            exclude_tag: Some(TAG_SOMEDAY.to_string()),
            sort_field: SortField::Project,
            timezone: DEFAULT_DISPLAY_TIMEZONE.to_string(),
        }
    }
}

impl SyncConfig {
    /// Sync attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Minimum sync interval as a [`Duration`].
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_seconds)
    }
}

impl ReportConfig {
    /// Parse the configured timezone name.
    ///
    /// # Errors
    /// Returns `TaskLensError::Config` for unknown IANA names.
    pub fn display_timezone(&self) -> Result<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(|_| TaskLensError::Config(format!("Unknown timezone: {}", self.timezone)))
    }
}

impl Config {
    /// Validate the loaded configuration.
    ///
    /// # Errors
    /// Returns `TaskLensError::Config` if any section is unusable; the
    /// process must not start serving in that case.
    pub fn validate(&self) -> Result<()> {
        if self.sync.timeout_seconds == 0 {
            return Err(TaskLensError::Config("sync.timeout_seconds must be positive".to_string()));
        }
        if self.taskwarrior.task_bin.trim().is_empty() {
            return Err(TaskLensError::Config("taskwarrior.task_bin must not be empty".to_string()));
        }
        if let Some(secret) = &self.server.auth_secret {
            if secret.is_empty() {
                return Err(TaskLensError::Config(
                    "server.auth_secret must not be empty when set".to_string(),
                ));
            }
        }
        self.report.display_timezone()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.timeout_seconds, DEFAULT_SYNC_TIMEOUT_SECONDS);
        assert_eq!(config.report.sort_field, SortField::Project);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.sync.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_auth_secret_is_rejected() {
        let mut config = Config::default();
        config.server.auth_secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut config = Config::default();
        config.report.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [sync]
            timeout_seconds = 5

            [report]
            sort_field = "tag-signature"
            "#,
        )
        .expect("valid config");
        assert_eq!(parsed.sync.timeout_seconds, 5);
        assert_eq!(parsed.sync.min_interval_seconds, DEFAULT_MIN_SYNC_INTERVAL_SECONDS);
        assert_eq!(parsed.report.sort_field, SortField::TagSignature);
    }
}
