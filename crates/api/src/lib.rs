//! # TaskLens App
//!
//! HTTP surface of TaskLens: the overview report endpoint, the liveness
//! endpoint, bearer-token authentication, and request logging. Thin by
//! design; all orchestration and data shaping lives in `tasklens-core`.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::get;
use axum::Router;

pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/overview", get(routes::get_overview))
        .route("/health", get(routes::get_health))
        .layer(middleware::from_fn(routes::log_requests))
        .with_state(state)
}
