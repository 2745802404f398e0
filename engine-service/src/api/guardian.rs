//! `POST /v1/guardian/classify` — GUARDIAN capability. One-shot only; a
//! `stream: true` body still round-trips through `run_capability` and
//! simply surfaces the runner contract's default `E406` frame.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use engine_common::Capability;

use super::{run_capability, InferenceRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn classify(State(state): State<Arc<AppState>>, Json(body): Json<InferenceRequest>) -> ApiResult<Response> {
    run_capability(&state, Capability::Guardian, body).await
}
