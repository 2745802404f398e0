//! A dependency-free ASR runner standing in for a real speech backend
//! (sherpa-onnx, whisper.cpp, ...). Its "transcription" is a deterministic
//! placeholder derived from the input size — the numerics are explicitly
//! out of scope (spec §1) — but the lifecycle, streaming, and metadata
//! shape follow the contract exactly, so it is a faithful fixture for
//! coordinator/engine-manager tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use engine_common::{Capability, EngineSettings, ParameterSchema, ParameterType, Request, Result as EngineResult, RunnerError};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cancel::CancelToken;
use crate::contract::{ResultStream, RunnerInstance};

pub struct LocalAsrRunner {
    loaded: AtomicBool,
    model_id: RwLock<String>,
}

impl LocalAsrRunner {
    pub fn new() -> Self {
        Self {
            loaded: AtomicBool::new(false),
            model_id: RwLock::new(String::new()),
        }
    }

    fn input_len(request: &Request) -> Option<usize> {
        if let Some(audio) = request.inputs.get("audio").and_then(Value::as_str) {
            return Some(audio.len());
        }
        request.input_str("audio_id").map(str::len)
    }
}

impl Default for LocalAsrRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerInstance for LocalAsrRunner {
    fn capabilities(&self) -> HashSet<Capability> {
        HashSet::from([Capability::Asr])
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
            return EngineResult::failed(RunnerError::not_loaded("local-asr not loaded"));
        }
        let Some(len) = Self::input_len(request) else {
            return EngineResult::failed(RunnerError::invalid_input("missing input: audio or audio_id"));
        };
        let language = request.param_str("language").unwrap_or("en").to_string();
        EngineResult::done(
            HashMap::from([("text".to_string(), Value::from(format!("[transcribed {len} bytes]")))]),
            HashMap::from([
                ("session_id".to_string(), Value::from(request.session_id.clone())),
                ("language".to_string(), Value::from(language)),
            ]),
        )
    }

    async fn run_as_flow(&self, request: Request, cancel: CancelToken) -> ResultStream {
        if !self.is_loaded().await {
            return Box::pin(futures::stream::once(async {
                EngineResult::failed(RunnerError::not_loaded("local-asr not loaded"))
            }));
        }
        let Some(len) = Self::input_len(&request) else {
            return Box::pin(futures::stream::once(async {
                EngineResult::failed(RunnerError::invalid_input("missing input: audio or audio_id"))
            }));
        };
        let session_id = request.session_id.clone();
        let segment_count = (len / 16).clamp(1, 5) as u32;

        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tokio::spawn(async move {
            for i in 0..segment_count {
                if cancel.is_cancelled() {
                    return;
                }
                let frame = EngineResult::partial(
                    HashMap::from([("text".to_string(), Value::from(format!("segment-{i}")))]),
                    HashMap::from([
                        ("session_id".to_string(), Value::from(session_id.clone())),
                        ("segment_index".to_string(), Value::from(i)),
                    ]),
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
                    HashMap::from([("text".to_string(), Value::from(format!("[transcribed {len} bytes]")))]),
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
        vec![ParameterSchema {
            name: "language".to_string(),
            param_type: ParameterType::String,
            constraints: None,
            default: Some(Value::from("en")),
            required: false,
            sensitive: false,
            category: Some("transcription".to_string()),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_requires_audio_input() {
        let runner = LocalAsrRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let result = runner.run(&Request::new("s1")).await;
        assert_eq!(result.error.unwrap().code, "E401");
    }

    #[tokio::test]
    async fn test_run_with_audio_id_succeeds() {
        let runner = LocalAsrRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let req = Request::new("s1").with_input("audio_id", "clip-123");
        let result = runner.run(&req).await;
        assert!(result.error.is_none());
        assert!(result.text().unwrap().contains("transcribed"));
    }
}
