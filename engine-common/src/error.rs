//! Runner error type and the fixed code ranges from spec §4.6/§7.

use serde::{Deserialize, Serialize};

/// A classified error surfaced to a request's terminal `Result`.
///
/// `cause` is for logging only; it is never serialized to clients (see
/// `Serialize` impl skipping it below — it is kept as a `String` debug
/// rendering rather than a boxed error so `RunnerError` stays `Send + Sync
/// + 'static` and cloneable for delivery across the coordinator boundary).
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct RunnerError {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
    #[serde(skip_serializing, default)]
    pub cause: Option<String>,
}

impl RunnerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recoverable,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn not_loaded(message: impl Into<String>) -> Self {
        Self::new("E001", message, true)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new("E101", message, true)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("E401", message, false)
    }

    pub fn runner_not_found(message: impl Into<String>) -> Self {
        Self::new("E404", message, false)
    }

    pub fn capability_unsupported(message: impl Into<String>) -> Self {
        Self::new("E405", message, false)
    }

    pub fn mode_unsupported(message: impl Into<String>) -> Self {
        Self::new("E406", message, false)
    }

    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::new("E501", message, true)
    }

    pub fn processing(code: impl Into<String>, message: impl Into<String>, recoverable: bool) -> Self {
        Self::new(code, message, recoverable)
    }

    /// Whether this code falls in the selection/validation (E4xx) range,
    /// which the propagation policy (spec §7) says is never retried.
    pub fn is_selection_error(&self) -> bool {
        self.code.starts_with("E4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RunnerError::not_loaded("x").code, "E001");
        assert_eq!(RunnerError::runtime("x").code, "E101");
        assert_eq!(RunnerError::invalid_input("x").code, "E401");
        assert_eq!(RunnerError::runner_not_found("x").code, "E404");
        assert_eq!(RunnerError::capability_unsupported("x").code, "E405");
        assert_eq!(RunnerError::mode_unsupported("x").code, "E406");
        assert_eq!(RunnerError::load_failed("x").code, "E501");
    }

    #[test]
    fn test_is_selection_error() {
        assert!(RunnerError::runner_not_found("x").is_selection_error());
        assert!(!RunnerError::runtime("x").is_selection_error());
    }

    #[test]
    fn test_cause_not_serialized() {
        let err = RunnerError::runtime("boom").with_cause("inner panic");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("inner panic"));
    }
}
