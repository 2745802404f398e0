//! Maps a [`RunnerError`] to an HTTP response, following the teacher's
//! `Error: IntoResponse` impl in `inference-runner/src/error.rs`: a fixed
//! per-code status plus a `{"error": {"code", "message"}}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engine_common::RunnerError;
use serde_json::json;

pub struct ApiError(pub RunnerError);

impl From<RunnerError> for ApiError {
    fn from(err: RunnerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for_code(&self.0.code);
        if status.is_server_error() {
            tracing::warn!(code = %self.0.code, message = %self.0.message, "request failed");
        }
        let body = Json(json!({
            "error": {
                "code": self.0.code,
                "message": self.0.message,
            }
        }));
        (status, body).into_response()
    }
}

/// `E4xx` → 4xx, `E001`/`E1xx`/`E5xx` → 5xx, per spec.md §7.
fn status_for_code(code: &str) -> StatusCode {
    match code {
        "E001" => StatusCode::SERVICE_UNAVAILABLE,
        "E401" => StatusCode::BAD_REQUEST,
        "E404" => StatusCode::NOT_FOUND,
        "E405" => StatusCode::UNPROCESSABLE_ENTITY,
        "E406" => StatusCode::NOT_ACCEPTABLE,
        other if other.starts_with("E4") => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
