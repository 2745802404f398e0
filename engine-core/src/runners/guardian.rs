//! GUARDIAN runners are one-shot only per spec §4.1; this keyword-based
//! classifier never overrides `run_as_flow`, so streaming it naturally
//! yields the default E406 frame.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use engine_common::{Capability, EngineSettings, Request, Result as EngineResult, RunnerError};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::contract::RunnerInstance;

pub struct KeywordGuardianRunner {
    loaded: AtomicBool,
    model_id: RwLock<String>,
    blocklist: Vec<String>,
}

impl KeywordGuardianRunner {
    pub fn new(blocklist: impl IntoIterator<Item = String>) -> Self {
        Self {
            loaded: AtomicBool::new(false),
            model_id: RwLock::new(String::new()),
            blocklist: blocklist.into_iter().collect(),
        }
    }
}

impl Default for KeywordGuardianRunner {
    fn default() -> Self {
        Self::new(["ignore previous instructions", "system prompt"].map(String::from))
    }
}

#[async_trait]
impl RunnerInstance for KeywordGuardianRunner {
    fn capabilities(&self) -> HashSet<Capability> {
        HashSet::from([Capability::Guardian])
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
            return EngineResult::failed(RunnerError::not_loaded("guardian not loaded"));
        }
        let Some(text) = request.input_str("text") else {
            return EngineResult::failed(RunnerError::invalid_input("missing required input: text"));
        };
        let lowered = text.to_lowercase();
        let flagged = self.blocklist.iter().find(|kw| lowered.contains(kw.as_str()));

        EngineResult::done(
            HashMap::from([
                ("flagged".to_string(), Value::from(flagged.is_some())),
                (
                    "reason".to_string(),
                    Value::from(flagged.cloned().unwrap_or_default()),
                ),
            ]),
            HashMap::from([("session_id".to_string(), Value::from(request.session_id.clone()))]),
        )
    }
}
