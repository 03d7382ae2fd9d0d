//! # TaskLens Infra
//!
//! Adapters and wiring around the core:
//! - Configuration loading (environment variables and config files)
//! - The Taskwarrior CLI adapter implementing the sync-engine and
//!   record-store ports

pub mod config;
pub mod taskwarrior;

pub use taskwarrior::TaskwarriorCli;
