//! Taskwarrior CLI adapter implementing the core ports.

pub mod cli;

pub use cli::TaskwarriorCli;
