//! The `Result` type a runner produces, one-shot or as a stream.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RunnerError;

/// Standard output keys.
pub mod keys {
    pub const TEXT: &str = "text";
    pub const AUDIO: &str = "audio";
}

/// Standard metadata keys.
pub mod meta_keys {
    pub const SESSION_ID: &str = "session_id";
    pub const MODEL_NAME: &str = "model_name";
    pub const LANGUAGE: &str = "language";
    pub const PROCESSING_TIME_MS: &str = "processing_time_ms";
}

/// A single emission for a request: one-shot, or one frame of a stream.
///
/// Invariant (enforced by constructors, not just convention): a `Result`
/// with `error.is_some()` always has `partial == false`. A stream of
/// `Result`s has zero or more `partial == true` frames followed by exactly
/// one `partial == false` terminal frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Result {
    #[serde(default)]
    pub outputs: HashMap<String, Value>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub partial: bool,
    #[serde(default)]
    pub error: Option<RunnerError>,
}

impl Result {
    /// A partial (non-terminal) frame. Never carries an error.
    pub fn partial(outputs: HashMap<String, Value>, metadata: HashMap<String, Value>) -> Self {
        Self {
            outputs,
            metadata,
            partial: true,
            error: None,
        }
    }

    /// A successful terminal frame.
    pub fn done(outputs: HashMap<String, Value>, metadata: HashMap<String, Value>) -> Self {
        Self {
            outputs,
            metadata,
            partial: false,
            error: None,
        }
    }

    /// A terminal frame carrying an error. Always non-partial.
    pub fn failed(error: RunnerError) -> Self {
        Self {
            outputs: HashMap::new(),
            metadata: HashMap::new(),
            partial: false,
            error: Some(error),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<Value>) -> Self {
        self.metadata
            .insert(meta_keys::SESSION_ID.to_string(), session_id.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        !self.partial
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn text(&self) -> Option<&str> {
        self.outputs.get(keys::TEXT).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_always_terminal() {
        let r = Result::failed(RunnerError::runtime("boom"));
        assert!(!r.partial);
        assert!(r.is_error());
    }

    #[test]
    fn test_partial_never_carries_error() {
        let r = Result::partial(HashMap::new(), HashMap::new());
        assert!(r.partial);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_text_accessor() {
        let mut outputs = HashMap::new();
        outputs.insert(keys::TEXT.to_string(), Value::String("hi".into()));
        let r = Result::done(outputs, HashMap::new());
        assert_eq!(r.text(), Some("hi"));
    }
}
