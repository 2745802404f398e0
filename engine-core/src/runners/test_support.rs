//! Test-only runner fixtures shared across engine-core's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use engine_common::{Capability, EngineSettings, Request, Result as EngineResult};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cancel::CancelToken;
use crate::contract::{ResultStream, RunnerInstance};

/// A minimal runner used to exercise the registry/discovery/manager
/// without depending on the concrete example runners. Tracks call counts
/// so tests can assert on lazy-load and idempotent-load behavior.
pub struct StubRunner {
    caps: HashSet<Capability>,
    loaded: AtomicBool,
    model_id: RwLock<String>,
    pub load_calls: AtomicU32,
    pub unload_calls: AtomicU32,
    pub run_calls: AtomicU32,
    fail_load: AtomicBool,
    streaming: bool,
    stream_frames: u32,
}

impl StubRunner {
    pub fn new(caps: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            caps: caps.into_iter().collect(),
            loaded: AtomicBool::new(false),
            model_id: RwLock::new(String::new()),
            load_calls: AtomicU32::new(0),
            unload_calls: AtomicU32::new(0),
            run_calls: AtomicU32::new(0),
            fail_load: AtomicBool::new(false),
            streaming: true,
            stream_frames: 10,
        }
    }

    pub fn non_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    pub fn with_stream_frames(mut self, n: u32) -> Self {
        self.stream_frames = n;
        self
    }

    pub fn failing_load(self) -> Self {
        self.fail_load.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl RunnerInstance for StubRunner {
    fn capabilities(&self) -> HashSet<Capability> {
        self.caps.clone()
    }

    async fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn loaded_model_id(&self) -> String {
        self.model_id.read().await.clone()
    }

    async fn load(&self, model_id: &str, _settings: &EngineSettings, _params: &HashMap<String, Value>) -> bool {
        if self.is_loaded().await && *self.model_id.read().await == model_id {
            return true;
        }
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_load.load(Ordering::SeqCst) {
            return false;
        }
        *self.model_id.write().await = model_id.to_string();
        self.loaded.store(true, Ordering::SeqCst);
        true
    }

    async fn unload(&self) {
        self.unload_calls.fetch_add(1, Ordering::SeqCst);
        self.loaded.store(false, Ordering::SeqCst);
        *self.model_id.write().await = String::new();
    }

    async fn run(&self, _request: &Request) -> EngineResult {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_loaded().await {
            return EngineResult::failed(engine_common::RunnerError::not_loaded("stub not loaded"));
        }
        EngineResult::done(
            HashMap::from([("text".to_string(), Value::from("stub output"))]),
            HashMap::new(),
        )
    }

    async fn run_as_flow(&self, _request: Request, cancel: CancelToken) -> ResultStream {
        if !self.streaming {
            return Box::pin(futures::stream::once(async {
                EngineResult::failed(engine_common::RunnerError::mode_unsupported("stub is non-streaming"))
            }));
        }
        let frames = self.stream_frames;
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tokio::spawn(async move {
            for i in 0..frames {
                if cancel.is_cancelled() {
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                if cancel.is_cancelled() {
                    return;
                }
                let frame = EngineResult::partial(
                    HashMap::from([("text".to_string(), Value::from(format!("chunk-{i}")))]),
                    HashMap::new(),
                );
                if tx.send(frame).await.is_err() {
                    return;
                }
            }
            let _ = tx
                .send(EngineResult::done(
                    HashMap::from([("text".to_string(), Value::from("done"))]),
                    HashMap::new(),
                ))
                .await;
        });
        Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }
}

pub fn arc(caps: impl IntoIterator<Item = Capability>) -> Arc<StubRunner> {
    Arc::new(StubRunner::new(caps))
}
