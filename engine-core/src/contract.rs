//! C1 — the runner contract every backend implements.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use engine_common::{Capability, ParameterSchema, Request, Result as EngineResult, RunnerError};
use futures::stream::BoxStream;
use serde_json::Value;

use crate::cancel::CancelToken;

/// Outcome of `validate_parameters`.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

/// A lazy, finite sequence of partial results ending in exactly one
/// terminal (non-partial) result.
pub type ResultStream = BoxStream<'static, EngineResult>;

/// Every backend a runner advertises implements this uniform interface.
///
/// `capabilities()` must be stable for the instance's lifetime, and a
/// superset of the owning [`engine_common::RunnerDescriptor`]'s
/// capabilities (checked by the registry on `register`).
///
/// Capability-mode matrix: ASR and LLM runners MUST support both `run` and
/// `run_as_flow`; TTS MAY implement both; GUARDIAN is one-shot only. The
/// default `run_as_flow` below returns a single E406 frame, which is
/// correct for GUARDIAN-style runners that never override it.
#[async_trait]
pub trait RunnerInstance: Send + Sync {
    /// Capabilities this instance serves. Stable for the instance's life.
    fn capabilities(&self) -> HashSet<Capability>;

    /// Whether `load` has completed successfully and not been undone by
    /// `unload`.
    async fn is_loaded(&self) -> bool;

    /// Identifier last passed to `load`; empty string when unloaded.
    async fn loaded_model_id(&self) -> String;

    /// Load a model. Idempotent: calling `load` again with the same
    /// `model_id` while already loaded with it is a no-op returning `true`.
    /// May block on I/O (callers should run CPU/disk heavy loads on a
    /// blocking thread; see engine-core::blocking).
    async fn load(
        &self,
        model_id: &str,
        settings: &engine_common::EngineSettings,
        initial_params: &HashMap<String, Value>,
    ) -> bool;

    /// Unload. Safe to call any number of times, including while already
    /// unloaded or never loaded.
    async fn unload(&self);

    /// One-shot inference. Never raises; returns an error `Result` when
    /// not loaded or on internal failure.
    async fn run(&self, request: &Request) -> EngineResult;

    /// Lazy streaming inference. `cancel` is consulted at every emission
    /// boundary; a well-behaved implementation stops producing further
    /// frames (and emits no terminal frame) within one check interval of
    /// `cancel.is_cancelled()` becoming true. Runners that don't support
    /// streaming for their capability return a single-frame stream with
    /// `error.code = "E406"` (the default implementation below does
    /// exactly this).
    async fn run_as_flow(&self, request: Request, cancel: CancelToken) -> ResultStream {
        let _ = (request, cancel);
        Box::pin(futures::stream::once(async {
            EngineResult::failed(RunnerError::mode_unsupported(
                "this runner does not support streaming",
            ))
        }))
    }

    /// Whether `run_as_flow` is meaningfully implemented (vs. the default
    /// E406 stub). Used by the engine manager to short-circuit
    /// `process_stream` without invoking the runner.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Pure, static: the parameters this instance accepts.
    fn parameter_schema(&self) -> Vec<ParameterSchema> {
        Vec::new()
    }

    /// Pure: validates `params` against `parameter_schema()`.
    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Validation {
        for schema in self.parameter_schema() {
            if schema.required && !params.contains_key(&schema.name) {
                return Validation::Invalid(format!("missing required parameter: {}", schema.name));
            }
        }
        Validation::Valid
    }

    /// Display name for logging; defaults to the Rust type name.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
