//! TaskLens - read-only HTTP JSON bridge over a Taskwarrior replica
//!
//! Main entry point: load configuration, wire the adapter, coordinator,
//! and router together, and serve until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tasklens_core::{ReportSettings, SyncCoordinator, SyncEngine, SyncPolicy, TaskStore};
use tasklens_infra::TaskwarriorCli;
use tasklens_lib::{router, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so configuration loading is visible.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = tasklens_infra::config::load().context("failed to load configuration")?;
    info!(
        bind_addr = %config.server.bind_addr,
        task_bin = %config.taskwarrior.task_bin,
        timezone = %config.report.timezone,
        auth_required = config.server.auth_secret.is_some(),
        "Configuration loaded"
    );

    let settings =
        ReportSettings::from_config(&config.report).context("invalid report settings")?;

    let adapter = Arc::new(TaskwarriorCli::new(config.taskwarrior.clone()));
    let engine: Arc<dyn SyncEngine> = adapter.clone();
    let store: Arc<dyn TaskStore> = adapter;

    let coordinator = Arc::new(SyncCoordinator::new(
        engine,
        SyncPolicy { min_interval: config.sync.min_interval(), sync_timeout: config.sync.timeout() },
    ));

    let state = AppState {
        coordinator,
        store,
        settings: Arc::new(settings),
        auth_secret: config.server.auth_secret.clone(),
        wait_budget: config.sync.timeout(),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(addr = %listener.local_addr()?, "TaskLens listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("TaskLens shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!(error = %err, "Failed to listen for shutdown signal"),
    }
}
