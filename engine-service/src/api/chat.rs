//! `POST /v1/chat/completions` — LLM capability. Generalizes the teacher's
//! `api/chat.rs` `chat_completions` handler: parse body, call the engine,
//! return the result.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use engine_common::Capability;

use super::{run_capability, InferenceRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn chat_completions(State(state): State<Arc<AppState>>, Json(body): Json<InferenceRequest>) -> ApiResult<Response> {
    run_capability(&state, Capability::Llm, body).await
}
