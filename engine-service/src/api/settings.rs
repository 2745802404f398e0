//! `POST /v1/settings` — the reload manager's (C7) entry point: persist a
//! full settings snapshot and reconcile already-active runners.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use engine_common::EngineSettings;
use engine_core::ReloadResult;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<EngineSettings>,
) -> ApiResult<Json<ReloadResult>> {
    state
        .reload
        .save_settings(settings)
        .await
        .map(Json)
        .map_err(|err| ApiError(engine_common::RunnerError::runtime(err.to_string())))
}
