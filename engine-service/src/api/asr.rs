//! `POST /v1/asr/transcriptions` — ASR capability.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use engine_common::Capability;

use super::{run_capability, InferenceRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn transcriptions(State(state): State<Arc<AppState>>, Json(body): Json<InferenceRequest>) -> ApiResult<Response> {
    run_capability(&state, Capability::Asr, body).await
}
