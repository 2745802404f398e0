//! C7 — reload manager: accepts a new [`EngineSettings`] snapshot, persists
//! it via the settings store, and reconciles already-active runners with
//! the new parameters without restarting the process.
//!
//! Reload policy (spec.md §4.7, resolved in DESIGN.md): a runner that is
//! *currently active* (has been loaded through the engine manager at least
//! once) is reloaded eagerly, right here, so the next request sees the new
//! parameters immediately. A runner that changed but was never activated
//! is left alone — it picks up the new settings the first time something
//! selects it, since the engine manager reads parameters fresh on every
//! first-load.

use std::collections::HashSet;
use std::sync::Arc;

use engine_common::{EngineSettings, RunnerError};
use serde::Serialize;

use crate::manager::EngineManager;
use crate::settings_store::{SettingsStore, SettingsStoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReloadResult {
    /// Runners that were active and were successfully unloaded/reloaded.
    pub reloaded: Vec<String>,
    /// Runners that were active but failed to reload; the engine manager
    /// leaves them unloaded (next use will retry via normal lazy load).
    pub failed: Vec<(String, RunnerError)>,
    /// Runners whose settings changed but that were never active; they
    /// will pick up the change lazily on first use.
    pub unaffected: Vec<String>,
}

pub struct ReloadManager {
    manager: Arc<EngineManager>,
    store: Arc<SettingsStore>,
}

impl ReloadManager {
    pub fn new(manager: Arc<EngineManager>, store: Arc<SettingsStore>) -> Self {
        Self { manager, store }
    }

    /// Loads the persisted settings (or an empty snapshot) and applies
    /// them to the engine manager. Called once at startup.
    pub async fn load_initial(&self) -> Result<(), SettingsStoreError> {
        let settings = self.store.load().await?;
        self.manager.apply_settings(settings).await;
        Ok(())
    }

    /// Persists `new`, applies it to the engine manager, and eagerly
    /// reloads every active runner whose effective parameters or default
    /// selection changed.
    pub async fn save_settings(&self, new: EngineSettings) -> Result<ReloadResult, SettingsStoreError> {
        let old = self.manager.current_settings().await;
        self.store.save(&new).await?;
        self.manager.apply_settings(new.clone()).await;

        let mut candidates: HashSet<String> = old.changed_runner_parameters(&new).into_iter().collect();
        for capability in old.changed_default_selections(&new) {
            if let Some(name) = old.selected_runner(capability) {
                candidates.insert(name.to_string());
            }
            if let Some(name) = new.selected_runner(capability) {
                candidates.insert(name.to_string());
            }
        }

        let mut result = ReloadResult::default();
        for name in candidates {
            if !self.manager.is_active(&name).await {
                result.unaffected.push(name);
                continue;
            }
            match self.manager.reload_runner(&name).await {
                Ok(()) => result.reloaded.push(name),
                Err(err) => result.failed.push((name, err)),
            }
        }
        result.reloaded.sort();
        result.unaffected.sort();
        result.failed.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::runners::test_support::arc;
    use engine_common::{Capability, Priority, Vendor};
    use std::sync::atomic::Ordering;

    async fn setup() -> (ReloadManager, Arc<EngineManager>, Arc<crate::runners::test_support::StubRunner>) {
        let registry = Arc::new(Registry::new());
        let runner = arc([Capability::Llm]);
        registry
            .register(
                runner.clone(),
                engine_common::RunnerDescriptor::new("echo-llm", Vendor::Custom, Priority::Normal)
                    .with_capabilities([Capability::Llm]),
            )
            .await;
        let manager = Arc::new(EngineManager::new(registry));
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        let reload = ReloadManager::new(manager.clone(), store);
        (reload, manager, runner)
    }

    #[tokio::test]
    async fn test_save_settings_persists_and_applies() {
        let (reload, manager, _) = setup().await;
        let mut settings = EngineSettings::empty();
        settings.selected_runners.insert(Capability::Llm, "echo-llm".to_string());

        reload.save_settings(settings.clone()).await.unwrap();
        assert_eq!(manager.current_settings().await, settings);
    }

    #[tokio::test]
    async fn test_inactive_runner_is_unaffected_not_reloaded() {
        let (reload, _, runner) = setup().await;
        let mut settings = EngineSettings::empty();
        settings
            .runner_parameters
            .insert("echo-llm".to_string(), std::collections::HashMap::from([("temperature".to_string(), 0.9.into())]));

        let result = reload.save_settings(settings).await.unwrap();
        assert_eq!(result.unaffected, vec!["echo-llm".to_string()]);
        assert!(result.reloaded.is_empty());
        assert_eq!(runner.load_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_active_runner_with_changed_parameters_reloads_eagerly() {
        let (reload, manager, runner) = setup().await;
        let req = engine_common::Request::new("s1").with_input("text", "hi");
        manager.process(Capability::Llm, Some("echo-llm"), &req).await;
        assert_eq!(runner.load_calls.load(Ordering::SeqCst), 1);

        let mut settings = EngineSettings::empty();
        settings
            .runner_parameters
            .insert("echo-llm".to_string(), std::collections::HashMap::from([("temperature".to_string(), 0.2.into())]));

        let result = reload.save_settings(settings).await.unwrap();
        assert_eq!(result.reloaded, vec!["echo-llm".to_string()]);
        assert_eq!(runner.load_calls.load(Ordering::SeqCst), 2);
        assert_eq!(runner.unload_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unchanged_settings_reload_nothing() {
        let (reload, manager, runner) = setup().await;
        let req = engine_common::Request::new("s1").with_input("text", "hi");
        manager.process(Capability::Llm, Some("echo-llm"), &req).await;

        let result = reload.save_settings(EngineSettings::empty()).await.unwrap();
        assert!(result.reloaded.is_empty());
        assert!(result.unaffected.is_empty());
        assert_eq!(runner.load_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_initial_applies_persisted_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        let mut settings = EngineSettings::empty();
        settings.selected_runners.insert(Capability::Asr, "local-asr".to_string());
        store.save(&settings).await.unwrap();

        let registry = Arc::new(Registry::new());
        let manager = Arc::new(EngineManager::new(registry));
        let reload = ReloadManager::new(manager.clone(), store);
        reload.load_initial().await.unwrap();

        assert_eq!(manager.current_settings().await, settings);
    }
}
