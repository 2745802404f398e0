//! C5 — engine manager: a thread-safe facade that, given `(capability,
//! preferred-runner?, request)`, produces a single `Result` or a stream of
//! partial `Result`s. Owns `active_runners` and `default_runners`.

use std::collections::HashMap;
use std::sync::Arc;

use engine_common::{Capability, EngineSettings, Request, Result as EngineResult, RunnerError};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use crate::cancel::CancelToken;
use crate::contract::{ResultStream, RunnerInstance};
use crate::priority;
use crate::registry::Registry;

/// Tracks live cancellation handles keyed by request id. A concurrent map
/// per spec §5 ("request_tracker (id → handle) is a concurrent map").
/// `Arc`-wrapped so a tracked stream can carry its own cleanup handle
/// without borrowing from the manager.
type RequestTracker = Arc<std::sync::Mutex<HashMap<String, CancelToken>>>;

pub struct EngineManager {
    registry: Arc<Registry>,
    active_runners: RwLock<HashMap<String, Arc<dyn RunnerInstance>>>,
    default_runners: RwLock<HashMap<Capability, String>>,
    settings: RwLock<EngineSettings>,
    /// One async mutex per runner name, so the manager never calls
    /// `load`/`unload` concurrently on the same instance even if two
    /// requests race to create it (spec §4.5/§5).
    load_guards: AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    request_tracker: RequestTracker,
}

impl EngineManager {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            active_runners: RwLock::new(HashMap::new()),
            default_runners: RwLock::new(HashMap::new()),
            settings: RwLock::new(EngineSettings::empty()),
            load_guards: AsyncMutex::new(HashMap::new()),
            request_tracker: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Replaces the default-runner-per-capability map, typically derived
    /// from `EngineSettings.selected_runners` at startup or reload.
    pub async fn set_defaults(&self, defaults: HashMap<Capability, String>) {
        *self.default_runners.write().await = defaults;
    }

    /// Adopts a new settings snapshot: updates `default_runners` from
    /// `selected_runners` and stores the snapshot for `load()` calls to
    /// read runner parameters from.
    pub async fn apply_settings(&self, settings: EngineSettings) {
        let defaults: HashMap<Capability, String> = settings.selected_runners.clone();
        *self.default_runners.write().await = defaults;
        *self.settings.write().await = settings;
    }

    pub async fn current_settings(&self) -> EngineSettings {
        self.settings.read().await.clone()
    }

    async fn load_guard_for(&self, name: &str) -> Arc<AsyncMutex<()>> {
        let mut guards = self.load_guards.lock().await;
        guards
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Double-checked get-or-create: a shared read-lock lookup first, then
    /// a write-lock create-if-absent. The instance itself was already
    /// constructed by discovery; "create" here means "start tracking it as
    /// active" (see spec §4.5's `active_runners` note).
    async fn get_or_create_runner(&self, name: &str) -> Option<Arc<dyn RunnerInstance>> {
        if let Some(instance) = self.active_runners.read().await.get(name) {
            return Some(Arc::clone(instance));
        }
        let mut active = self.active_runners.write().await;
        if let Some(instance) = active.get(name) {
            return Some(Arc::clone(instance));
        }
        let (instance, _descriptor) = self.registry.get_by_name(name).await?;
        active.insert(name.to_string(), Arc::clone(&instance));
        Some(instance)
    }

    /// Implements the selection algorithm from spec §4.5 steps 1-4.
    async fn select(
        &self,
        capability: Capability,
        preferred: Option<&str>,
    ) -> std::result::Result<(String, Arc<dyn RunnerInstance>), RunnerError> {
        let name = if let Some(preferred) = preferred {
            if self.registry.get_by_name(preferred).await.is_none() {
                return Err(RunnerError::runner_not_found(format!(
                    "preferred runner not registered: {preferred}"
                )));
            }
            preferred.to_string()
        } else if let Some(default) = self.default_runners.read().await.get(&capability).cloned() {
            if self.registry.get_by_name(&default).await.is_some() {
                default
            } else {
                self.pick_by_priority(capability).await?
            }
        } else {
            self.pick_by_priority(capability).await?
        };

        let instance = self
            .get_or_create_runner(&name)
            .await
            .ok_or_else(|| RunnerError::runner_not_found(format!("runner not registered: {name}")))?;

        if !instance.capabilities().contains(&capability) {
            return Err(RunnerError::capability_unsupported(format!(
                "runner {name} does not support capability {capability}"
            )));
        }

        Ok((name, instance))
    }

    async fn pick_by_priority(&self, capability: Capability) -> std::result::Result<String, RunnerError> {
        let candidates = self.registry.get_all(capability).await;
        priority::resolve(&candidates)
            .map(|d| d.name.clone())
            .ok_or_else(|| RunnerError::runner_not_found(format!("no runner registered for capability {capability}")))
    }

    /// Loads `instance` if not already loaded. Model id precedence:
    /// descriptor default, overridden by a `model_id` key in the runner's
    /// settings parameters, if any.
    ///
    /// Callers must hold `name`'s load guard for the duration of this call
    /// *and* for as long afterwards as they keep using `instance` — this
    /// method itself does not acquire it, so a reload can never unload the
    /// instance out from under a request that already passed this point.
    async fn load_locked(&self, name: &str, instance: &Arc<dyn RunnerInstance>) -> std::result::Result<(), RunnerError> {
        if instance.is_loaded().await {
            return Ok(());
        }

        let settings = self.settings.read().await.clone();
        let params = settings.parameters_for(name);
        let from_params = params
            .get("model_id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let model_id = match from_params {
            Some(id) => id,
            None => self
                .registry
                .get_by_name(name)
                .await
                .and_then(|(_, d)| d.default_model_id)
                .unwrap_or_default(),
        };

        tracing::info!(runner = %name, model_id = %model_id, "loading runner");
        if instance.load(&model_id, &settings, &params).await {
            Ok(())
        } else {
            Err(RunnerError::load_failed(format!("runner {name} failed to load model {model_id}")))
        }
    }

    /// Selects a runner and loads it, returning the instance together with
    /// its load guard held (as an owned permit) for the caller to keep
    /// across the subsequent `run`/`run_as_flow` call. This is what keeps
    /// a concurrent `reload_runner` from unloading the instance while a
    /// request that already cleared selection is still running against it.
    async fn select_and_load(
        &self,
        capability: Capability,
        preferred: Option<&str>,
    ) -> std::result::Result<(Arc<dyn RunnerInstance>, tokio::sync::OwnedMutexGuard<()>), RunnerError> {
        let (name, instance) = self.select(capability, preferred).await?;
        let guard = self.load_guard_for(&name).await;
        let permit = guard.lock_owned().await;
        self.load_locked(&name, &instance).await?;
        Ok((instance, permit))
    }

    /// One-shot path. Selection errors become the result's `error`.
    /// A panic inside the runner is caught (via `tokio::spawn`/`JoinError`)
    /// and reported as `E101`, mirroring the source's exception-wrapping
    /// policy (spec §4.6/§7) in a language with no catchable exceptions.
    pub async fn process(&self, capability: Capability, preferred: Option<&str>, request: &Request) -> EngineResult {
        let (instance, permit) = match self.select_and_load(capability, preferred).await {
            Ok(v) => v,
            Err(err) => return EngineResult::failed(err),
        };

        let request = request.clone();
        match tokio::spawn(async move {
            let result = instance.run(&request).await;
            drop(permit);
            result
        })
        .await
        {
            Ok(result) => result,
            Err(join_err) => EngineResult::failed(RunnerError::runtime(format!("runner panicked: {join_err}"))),
        }
    }

    /// Streaming path. `request_id` keys the cancellation handle tracked
    /// for the lifetime of the returned stream's consumption; callers
    /// (the request coordinator) forward it to `cancel()`.
    pub async fn process_stream(
        &self,
        capability: Capability,
        preferred: Option<&str>,
        request: Request,
        request_id: String,
    ) -> ResultStream {
        let (instance, permit) = match self.select_and_load(capability, preferred).await {
            Ok(v) => v,
            Err(err) => return Box::pin(futures::stream::once(async { EngineResult::failed(err) })),
        };

        if !instance.supports_streaming() {
            return Box::pin(futures::stream::once(async move {
                drop(permit);
                EngineResult::failed(RunnerError::mode_unsupported("runner does not support streaming"))
            }));
        }

        let cancel = CancelToken::new();
        self.request_tracker
            .lock()
            .expect("request tracker mutex poisoned")
            .insert(request_id.clone(), cancel.clone());

        let inner = instance.run_as_flow(request, cancel).await;
        let cleanup = TrackerCleanup {
            tracker: Arc::clone(&self.request_tracker),
            request_id,
        };
        Box::pin(TrackedStream {
            inner,
            _cleanup: cleanup,
            _load_permit: permit,
        })
    }

    /// Signals the cancellation handle tracked for `request_id`, if any.
    /// Returns whether a live handle was found.
    pub fn cancel(&self, request_id: &str) -> bool {
        let tracker = self.request_tracker.lock().expect("request tracker mutex poisoned");
        if let Some(token) = tracker.get(request_id) {
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Whether `request_id`'s cancellation handle has been signalled.
    /// `false` both for "never cancelled" and "handle no longer tracked" —
    /// callers use this only while the handle is still known to be live
    /// (e.g. mid-stream, before its `TrackerCleanup` runs).
    pub fn was_cancelled(&self, request_id: &str) -> bool {
        let tracker = self.request_tracker.lock().expect("request tracker mutex poisoned");
        tracker.get(request_id).map(|token| token.is_cancelled()).unwrap_or(false)
    }

    /// Whether `name` has ever been touched through this manager (used by
    /// the reload manager to decide eager vs. lazy reload).
    pub async fn is_active(&self, name: &str) -> bool {
        self.active_runners.read().await.contains_key(name)
    }

    /// Forces a reload of an already-active instance: `unload` then
    /// `load` again, picking up whatever settings/parameters are current.
    /// Used by the reload manager for runners that are an active default
    /// at the moment settings change (spec.md's "eager reload" path).
    ///
    /// Holds `name`'s load guard across the whole unload+load sequence —
    /// the same guard `process`/`process_stream` hold for the duration of
    /// their `run`/`run_as_flow` call — so this can only interleave with a
    /// request before it has started running or after it has finished,
    /// never mid-flight.
    pub async fn reload_runner(&self, name: &str) -> std::result::Result<(), RunnerError> {
        let instance = self
            .get_or_create_runner(name)
            .await
            .ok_or_else(|| RunnerError::runner_not_found(format!("runner not registered: {name}")))?;
        let guard = self.load_guard_for(name).await;
        let _permit = guard.lock().await;
        instance.unload().await;
        self.load_locked(name, &instance).await
    }

    /// Best-effort `unload()` of every currently-active instance. The
    /// registry keeps the instance, so subsequent use re-loads lazily.
    pub async fn unload_all_models(&self) {
        let instances: Vec<Arc<dyn RunnerInstance>> = self.active_runners.read().await.values().cloned().collect();
        for instance in instances {
            instance.unload().await;
        }
    }

    /// Unloads and clears the active map, for abnormal shutdown. Individual
    /// failures are swallowed after logging (unload itself cannot fail in
    /// this contract, but is wrapped defensively in tracing context).
    pub async fn force_cleanup_all(&self) {
        let mut active = self.active_runners.write().await;
        for (name, instance) in active.drain() {
            tracing::info!(runner = %name, "force unloading");
            instance.unload().await;
        }
    }
}

/// Removes the cancel-token entry for `request_id` once the stream it
/// guards is no longer being consumed (dropped or exhausted).
struct TrackerCleanup {
    tracker: RequestTracker,
    request_id: String,
}

impl Drop for TrackerCleanup {
    fn drop(&mut self) {
        self.tracker
            .lock()
            .expect("request tracker mutex poisoned")
            .remove(&self.request_id);
    }
}

struct TrackedStream<S> {
    inner: S,
    _cleanup: TrackerCleanup,
    /// Held for the stream's entire lifetime so a concurrent
    /// `reload_runner` cannot unload the instance while this stream is
    /// still being consumed.
    _load_permit: tokio::sync::OwnedMutexGuard<()>,
}

impl<S: futures::Stream<Item = EngineResult> + Unpin> futures::Stream for TrackedStream<S> {
    type Item = EngineResult;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        std::pin::Pin::new(&mut self.inner).poll_next(cx)
    }
}
