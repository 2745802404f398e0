//! The ingress layer (C10): one thin Axum handler per verb, generalizing
//! the teacher's `api/chat.rs` to the four capability routes plus the
//! runners/settings endpoints its `api/models.rs` pattern points toward.

pub mod asr;
pub mod chat;
pub mod guardian;
pub mod health;
pub mod runners;
pub mod settings;
pub mod tts;

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use engine_common::Capability;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/completions", post(chat::chat_completions))
        .route("/asr/transcriptions", post(asr::transcriptions))
        .route("/tts/speech", post(tts::speech))
        .route("/guardian/classify", post(guardian::classify))
        .route("/runners", get(runners::list_runners))
        .route("/settings", post(settings::save_settings))
}

/// The JSON body shared by every capability route: a session id, the
/// capability-specific `inputs`/`params` (spec.md §3's `Request` shape),
/// an optional preferred runner name, and a `stream` flag selecting
/// SSE framing over a single JSON object.
#[derive(Debug, Deserialize)]
pub struct InferenceRequest {
    pub session_id: String,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default)]
    pub runner: Option<String>,
    #[serde(default)]
    pub stream: bool,
}

impl InferenceRequest {
    fn into_request(self) -> engine_common::Request {
        let mut request = engine_common::Request::new(self.session_id);
        request.inputs = self.inputs;
        request.params = self.params;
        request
    }
}

/// Shared handler body for the four capability routes: select/load via the
/// coordinator, then either stream SSE frames or return the single result.
pub(crate) async fn run_capability(
    state: &AppState,
    capability: Capability,
    body: InferenceRequest,
) -> ApiResult<Response> {
    let runner = body.runner.clone();
    let stream = body.stream;
    let request = body.into_request();

    if stream {
        let (_request_id, result_stream) = state
            .coordinator
            .process_stream(capability, runner.as_deref(), request)
            .await;
        Ok(sse_response(result_stream))
    } else {
        let (_request_id, result) = state.coordinator.process(capability, runner.as_deref(), request).await;
        match result.error.clone() {
            Some(err) => Err(ApiError(err)),
            None => Ok(Json(result).into_response()),
        }
    }
}

fn sse_response(stream: engine_core::ResultStream) -> Response {
    let events = stream.map(|frame| {
        let data = serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string());
        Ok::<Event, Infallible>(Event::default().data(data))
    });
    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}
