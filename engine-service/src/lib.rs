//! Ingress layer (C10) for the engine runtime: HTTP routes, configuration,
//! and the shared application state, kept as a library so integration
//! tests can build the real router in-process with `tower::oneshot`.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod state;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use state::AppState;

/// Assembles the full HTTP router against `app_state` — the same routing
/// table `main.rs` serves, exposed here for integration tests.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/v1", api::router())
        .route("/health", get(api::health::health))
        .with_state(app_state)
}
