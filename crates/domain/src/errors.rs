//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for TaskLens
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TaskLensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for TaskLens operations
pub type Result<T> = std::result::Result<T, TaskLensError>;
