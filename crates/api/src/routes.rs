//! Request handlers for the overview and liveness endpoints.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use tasklens_core::report::{project, render_in_zone, render_meta};
use tasklens_domain::{HealthResponse, OverviewResponse};
use tracing::{error, info, warn};

use crate::auth::check_bearer;
use crate::error::ApiError;
use crate::state::AppState;

/// Overview report: freshen if warranted, read the store, project.
///
/// Sync failures and timeouts only annotate the metadata; a store read
/// failure is the one path that fails the request outright.
pub async fn get_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OverviewResponse>, ApiError> {
    check_bearer(&headers, state.auth_secret.as_deref())?;

    let meta = state.coordinator.ensure_fresh_enough(state.wait_budget).await;

    let records = state.store.read_all().await.map_err(|err| {
        error!(error = %err, "Record store read failed");
        ApiError::Internal("Failed to read tasks".to_string())
    })?;

    let projection = project(&records, &state.settings);
    if projection.skipped > 0 {
        warn!(skipped = projection.skipped, "Excluded records with malformed timestamps");
    }

    Ok(Json(OverviewResponse {
        meta: render_meta(&meta, state.settings.timezone),
        tasks: projection.tasks,
    }))
}

/// Liveness check; reads snapshot state only, never triggers a sync.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let last_sync_at = state
        .coordinator
        .last_known_sync()
        .await
        .map(|at| render_in_zone(at, state.settings.timezone));

    Json(HealthResponse { status: "healthy".to_string(), last_sync_at })
}

/// Log every request with its status and duration.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path,
        status = response.status().as_u16(),
        duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Request handled"
    );
    response
}
