//! A one-shot-only TTS runner. Per spec §4.1, TTS MAY implement streaming;
//! this one deliberately does not, so `process_stream` against it is the
//! concrete example of the E406 "mode unsupported" path.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use engine_common::{Capability, EngineSettings, Request, Result as EngineResult, RunnerError};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::contract::RunnerInstance;

pub struct LocalTtsRunner {
    loaded: AtomicBool,
    model_id: RwLock<String>,
}

impl LocalTtsRunner {
    pub fn new() -> Self {
        Self {
            loaded: AtomicBool::new(false),
            model_id: RwLock::new(String::new()),
        }
    }
}

impl Default for LocalTtsRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerInstance for LocalTtsRunner {
    fn capabilities(&self) -> HashSet<Capability> {
        HashSet::from([Capability::Tts])
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
            return EngineResult::failed(RunnerError::not_loaded("local-tts not loaded"));
        }
        let Some(text) = request.input_str("text").filter(|t| !t.is_empty()) else {
            return EngineResult::failed(RunnerError::invalid_input("missing required input: text"));
        };
        // Placeholder waveform: the byte length of the text, base64-encoded,
        // stands in for real synthesized audio (numerics out of scope).
        let fake_pcm = vec![0u8; text.len() * 2];
        let audio_b64 = base64::engine::general_purpose::STANDARD.encode(fake_pcm);
        EngineResult::done(
            HashMap::from([("audio".to_string(), Value::from(audio_b64))]),
            HashMap::from([("session_id".to_string(), Value::from(request.session_id.clone()))]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;

    #[tokio::test]
    async fn test_run_produces_audio_output() {
        let runner = LocalTtsRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let req = Request::new("s1").with_input("text", "hello");
        let result = runner.run(&req).await;
        assert!(result.outputs.contains_key("audio"));
    }

    #[tokio::test]
    async fn test_run_as_flow_defaults_to_mode_unsupported() {
        let runner = LocalTtsRunner::new();
        runner.load("m1", &EngineSettings::empty(), &HashMap::new()).await;
        let req = Request::new("s1").with_input("text", "hello");
        let mut stream = runner.run_as_flow(req, CancelToken::new()).await;
        use futures::StreamExt;
        let frame = stream.next().await.unwrap();
        assert_eq!(frame.error.unwrap().code, "E406");
        assert!(stream.next().await.is_none());
    }
}
