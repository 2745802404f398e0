//! A small, self-contained LLM runner: no external process or network
//! call, suitable as a safe default and as a manager/coordinator test
//! fixture. Structured the way the teacher structures `OllamaEngine` —
//! a handful of fields, a `load`/`run`/stream triad — minus the HTTP
//! client, since this runner's "inference" is a deterministic transform
//! rather than a call to a backend process.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use engine_common::{
    Capability, EngineSettings, ParameterSchema, ParameterType, Request, Result as EngineResult, RunnerError,
};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cancel::CancelToken;
use crate::contract::{ResultStream, RunnerInstance, Validation};

pub struct EchoLlmRunner {
    loaded: AtomicBool,
    model_id: RwLock<String>,
}

impl EchoLlmRunner {
    pub fn new() -> Self {
        Self {
            loaded: AtomicBool::new(false),
            model_id: RwLock::new(String::new()),
        }
    }

    fn generate(&self, text: &str, max_tokens: Option<u64>) -> String {
        let reply = format!("Echo: {text}");
        match max_tokens {
            Some(limit) => reply.split_whitespace().take(limit as usize).collect::<Vec<_>>().join(" "),
            None => reply,
        }
    }
}

impl Default for EchoLlmRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerInstance for EchoLlmRunner {
    fn capabilities(&self) -> HashSet<Capability> {
        HashSet::from([Capability::Llm])
    }

    async fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn loaded_model_id(&self) -> String {
        self.model_id.read().await.clone()
    }

    async fn load(&self, model_id: &str, _settings: &EngineSettings, _initial_params: &HashMap<String, Value>) -> bool {
        if self.is_loaded().await && *self.model_id.read().await == model_id {
            return true;
        }
        *self.model_id.write().await = model_id.to_string();
        self.loaded.store(true, Ordering::SeqCst);
        true
    }

    async fn unload(&self) {
        self.loaded.store(false, Ordering::SeqCst);
        *self.model_id.write().await = String::new();
    }

    async fn run(&self, request: &Request) -> EngineResult {
        if !self.is_loaded().await {
            return EngineResult::failed(RunnerError::not_loaded("echo-llm not loaded"));
        }
        let Some(text) = request.input_str("text").filter(|t| !t.is_empty()) else {
            return EngineResult::failed(RunnerError::invalid_input("missing required input: text"));
        };
        let reply = self.generate(text, request.param_u64("max_tokens"));
        let model_name = self.loaded_model_id().await;
        EngineResult::done(
            HashMap::from([("text".to_string(), Value::from(reply))]),
            HashMap::from([
                ("session_id".to_string(), Value::from(request.session_id.clone())),
                ("model_name".to_string(), Value::from(model_name)),
            ]),
        )
    }

    async fn run_as_flow(&self, request: Request, cancel: CancelToken) -> ResultStream {
        if !self.is_loaded().await {
            return Box::pin(futures::stream::once(async {
                EngineResult::failed(RunnerError::not_loaded("echo-llm not loaded"))
            }));
        }
        let Some(text) = request.input_str("text").filter(|t| !t.is_empty()).map(str::to_owned) else {
            return Box::pin(futures::stream::once(async {
                EngineResult::failed(RunnerError::invalid_input("missing required input: text"))
            }));
        };
        let session_id = request.session_id.clone();
        let words: Vec<String> = self
            .generate(&text, request.param_u64("max_tokens"))
            .split_whitespace()
            .map(str::to_owned)
            .collect();

        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tokio::spawn(async move {
            let mut emitted = String::new();
            for word in &words {
                if cancel.is_cancelled() {
                    return;
                }
                if !emitted.is_empty() {
                    emitted.push(' ');
                }
                emitted.push_str(word);
                let frame = EngineResult::partial(
                    HashMap::from([("text".to_string(), Value::from(word.clone()))]),
                    HashMap::from([("session_id".to_string(), Value::from(session_id.clone()))]),
                );
                if tx.send(frame).await.is_err() {
                    return;
                }
            }
            if cancel.is_cancelled() {
                return;
            }
            let _ = tx
                .send(EngineResult::done(
                    HashMap::from([("text".to_string(), Value::from(emitted))]),
                    HashMap::from([("session_id".to_string(), Value::from(session_id))]),
                ))
                .await;
        });
        Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn parameter_schema(&self) -> Vec<ParameterSchema> {
        vec![
            ParameterSchema {
                name: "temperature".to_string(),
                param_type: ParameterType::Float,
                constraints: Some("0.0..=2.0".to_string()),
                default: Some(Value::from(1.0)),
                required: false,
                sensitive: false,
                category: Some("generation".to_string()),
            },
            ParameterSchema {
                name: "max_tokens".to_string(),
                param_type: ParameterType::Integer,
                constraints: Some(">= 1".to_string()),
                default: None,
                required: false,
                sensitive: false,
                category: Some("generation".to_string()),
            },
        ]
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Validation {
        if let Some(t) = params.get("temperature").and_then(Value::as_f64) {
            if !(0.0..=2.0).contains(&t) {
                return Validation::Invalid("temperature must be within 0.0..=2.0".to_string());
            }
        }
        Validation::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_run_before_load_is_not_loaded_error() {
        let runner = EchoLlmRunner::new();
        let req = Request::new("s1").with_input("text", "hi");
        let result = runner.run(&req).await;
        assert_eq!(result.error.unwrap().code, "E001");
    }

    #[tokio::test]
    async fn test_run_echoes_text() {
        let runner = EchoLlmRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let req = Request::new("s1").with_input("text", "hello world");
        let result = runner.run(&req).await;
        assert_eq!(result.text(), Some("Echo: hello world"));
        assert!(!result.partial);
    }

    #[tokio::test]
    async fn test_run_missing_text_is_invalid_input() {
        let runner = EchoLlmRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let req = Request::new("s1");
        let result = runner.run(&req).await;
        assert_eq!(result.error.unwrap().code, "E401");
    }

    #[tokio::test]
    async fn test_load_idempotent() {
        let runner = EchoLlmRunner::new();
        assert!(runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await);
        assert!(runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await);
        assert_eq!(runner.loaded_model_id().await, "m1");
    }

    #[tokio::test]
    async fn test_run_as_flow_ends_with_terminal_nonpartial() {
        let runner = EchoLlmRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let req = Request::new("s1").with_input("text", "a b c");
        let mut stream = runner.run_as_flow(req, CancelToken::new()).await;
        let mut frames = Vec::new();
        while let Some(frame) = stream.next().await {
            frames.push(frame);
        }
        assert!(frames.iter().rev().skip(1).all(|f| f.partial));
        assert!(!frames.last().unwrap().partial);
    }
}
