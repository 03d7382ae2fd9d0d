//! Domain constants and default configuration values

/// Tag that marks a task as deferred and keeps it out of the overview.
pub const TAG_SOMEDAY: &str = "someday";

/// Number of identifier characters exposed as the display short id.
pub const SHORT_ID_LEN: usize = 8;

/// Timezone used to render timestamps when none is configured.
pub const DEFAULT_DISPLAY_TIMEZONE: &str = "Europe/Zurich";

/// Default address the HTTP server binds to.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default upper bound on a single sync attempt, in seconds.
pub const DEFAULT_SYNC_TIMEOUT_SECONDS: u64 = 30;

/// Default minimum interval between sync attempts, in seconds.
pub const DEFAULT_MIN_SYNC_INTERVAL_SECONDS: u64 = 10;

/// Default Taskwarrior binary invoked by the CLI adapter.
pub const DEFAULT_TASK_BIN: &str = "task";

/// Default number of attempts for a transiently failing sync.
pub const DEFAULT_SYNC_RETRY_ATTEMPTS: u32 = 3;

/// Default delay between sync retries, in seconds.
pub const DEFAULT_SYNC_RETRY_DELAY_SECONDS: u64 = 2;
