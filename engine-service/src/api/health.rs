//! `GET /health` — liveness plus the current [`ServiceState`], generalizing
//! the teacher's trivial `{"status": "ok"}` health check.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "state": state.state_publisher.current(),
    }))
}
