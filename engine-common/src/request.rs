//! The `Request` type passed from ingress through to a runner.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single piece of client work.
///
/// Recognized `inputs` keys are capability-dependent: LLM uses `text`; ASR
/// uses `audio` (base64-encoded bytes) or `audio_id`; TTS uses `text`; VLM
/// uses `text` + `image`. Recognized `params` keys include `temperature`,
/// `max_tokens`, `language`, plus runner-specific keys validated against
/// the instance's parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub session_id: String,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Request {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            inputs: HashMap::new(),
            params: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }
}
