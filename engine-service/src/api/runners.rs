//! `GET /v1/runners` — introspection. Generalizes the teacher's
//! `GET /v1/models` (`api/models.rs`) from "models served by every engine"
//! to "every registered runner descriptor."

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use engine_common::RunnerDescriptor;

use crate::state::AppState;

pub async fn list_runners(State(state): State<Arc<AppState>>) -> Json<Vec<RunnerDescriptor>> {
    let descriptors = state.coordinator.manager().registry().get_all_descriptors().await;
    Json(descriptors)
}
