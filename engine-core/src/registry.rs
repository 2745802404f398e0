//! C2 — the runner registry: indexes runner instances by name and by
//! capability.

use std::collections::HashMap;
use std::sync::Arc;

use engine_common::{Capability, RunnerDescriptor};
use tokio::sync::RwLock;

use crate::contract::RunnerInstance;

struct Entry {
    instance: Arc<dyn RunnerInstance>,
    descriptor: RunnerDescriptor,
}

/// `by_name` plus a precomputed `by_capability` ordering by priority
/// score (lower score first, ties broken by name).
///
/// Invariant: every name in `by_capability[c]` maps to an entry whose
/// descriptor lists `c`. This is maintained by rebuilding the capability
/// index on every `register`/`unregister`/`clear`.
pub struct Registry {
    by_name: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `instance` under `descriptor.name`. If the name already
    /// exists, the new registration wins and the collision is logged.
    ///
    /// Rejects (logs and skips) a descriptor whose advertised capabilities
    /// are not a subset of what `instance` actually implements — the
    /// invariant `instance.capabilities() ⊇ descriptor.capabilities`
    /// documented on [`RunnerInstance::capabilities`].
    pub async fn register(&self, instance: Arc<dyn RunnerInstance>, descriptor: RunnerDescriptor) {
        if !instance.capabilities().is_superset(&descriptor.capabilities) {
            tracing::error!(
                name = %descriptor.name,
                instance_capabilities = ?instance.capabilities(),
                descriptor_capabilities = ?descriptor.capabilities,
                "refusing to register runner: descriptor claims capabilities the instance does not implement"
            );
            return;
        }

        let mut map = self.by_name.write().await;
        if map.contains_key(&descriptor.name) {
            tracing::warn!(name = %descriptor.name, "runner name collision, replacing prior registration");
        }
        map.insert(
            descriptor.name.clone(),
            Entry {
                instance,
                descriptor,
            },
        );
    }

    /// Best-effort unloads the instance then evicts it from the registry.
    pub async fn unregister(&self, name: &str) {
        let entry = {
            let mut map = self.by_name.write().await;
            map.remove(name)
        };
        if let Some(entry) = entry {
            entry.instance.unload().await;
        }
    }

    pub async fn get_by_name(&self, name: &str) -> Option<(Arc<dyn RunnerInstance>, RunnerDescriptor)> {
        let map = self.by_name.read().await;
        map.get(name)
            .map(|e| (Arc::clone(&e.instance), e.descriptor.clone()))
    }

    /// Every registered descriptor advertising `capability`, ordered by
    /// `RunnerDescriptor::score()` ascending, ties broken by name.
    pub async fn get_all(&self, capability: Capability) -> Vec<RunnerDescriptor> {
        let map = self.by_name.read().await;
        let mut out: Vec<RunnerDescriptor> = map
            .values()
            .filter(|e| e.descriptor.capabilities.contains(&capability))
            .map(|e| e.descriptor.clone())
            .collect();
        out.sort_by(|a, b| a.score().cmp(&b.score()).then_with(|| a.name.cmp(&b.name)));
        out
    }

    pub async fn get_all_descriptors(&self) -> Vec<RunnerDescriptor> {
        let map = self.by_name.read().await;
        map.values().map(|e| e.descriptor.clone()).collect()
    }

    pub async fn supported_capabilities(&self) -> Vec<Capability> {
        let map = self.by_name.read().await;
        let mut set = std::collections::HashSet::new();
        for e in map.values() {
            set.extend(e.descriptor.capabilities.iter().copied());
        }
        let mut caps: Vec<Capability> = set.into_iter().collect();
        caps.sort_by_key(|c| c.to_string());
        caps
    }

    /// Unloads and evicts every registered instance. Used by discovery's
    /// `reinitialize()`.
    pub async fn clear(&self) {
        let entries: Vec<Entry> = {
            let mut map = self.by_name.write().await;
            map.drain().map(|(_, e)| e).collect()
        };
        for entry in entries {
            entry.instance.unload().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.by_name.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::test_support::StubRunner;
    use engine_common::{Priority, Vendor};

    fn descriptor(name: &str, caps: &[Capability]) -> RunnerDescriptor {
        RunnerDescriptor::new(name, Vendor::Custom, Priority::Normal).with_capabilities(caps.to_vec())
    }

    #[tokio::test]
    async fn test_register_and_get_by_name() {
        let registry = Registry::new();
        let instance = Arc::new(StubRunner::new([Capability::Llm]));
        registry
            .register(instance.clone(), descriptor("r1", &[Capability::Llm]))
            .await;

        let (_, desc) = registry.get_by_name("r1").await.unwrap();
        assert_eq!(desc.name, "r1");
    }

    #[tokio::test]
    async fn test_get_all_orders_by_score_then_name() {
        let registry = Registry::new();
        let hi = RunnerDescriptor::new("b-hi", Vendor::Mediatek, Priority::High)
            .with_capabilities([Capability::Llm]);
        let lo = RunnerDescriptor::new("a-lo", Vendor::Custom, Priority::Low)
            .with_capabilities([Capability::Llm]);
        registry
            .register(Arc::new(StubRunner::new([Capability::Llm])), hi.clone())
            .await;
        registry
            .register(Arc::new(StubRunner::new([Capability::Llm])), lo.clone())
            .await;

        let all = registry.get_all(Capability::Llm).await;
        assert_eq!(all[0].name, "b-hi");
        assert_eq!(all[1].name, "a-lo");
    }

    #[tokio::test]
    async fn test_unregister_removes_and_unloads() {
        let registry = Registry::new();
        let instance = Arc::new(StubRunner::new([Capability::Asr]));
        registry
            .register(instance.clone(), descriptor("r1", &[Capability::Asr]))
            .await;
        registry.unregister("r1").await;
        assert!(registry.get_by_name("r1").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_registry() {
        let registry = Registry::new();
        registry
            .register(
                Arc::new(StubRunner::new([Capability::Tts])),
                descriptor("r1", &[Capability::Tts]),
            )
            .await;
        registry.clear().await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_rejects_descriptor_claiming_unimplemented_capability() {
        let registry = Registry::new();
        let instance = Arc::new(StubRunner::new([Capability::Asr]));
        registry
            .register(instance, descriptor("over-claims", &[Capability::Asr, Capability::Llm]))
            .await;
        assert!(registry.get_by_name("over-claims").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_name_collision_later_wins() {
        let registry = Registry::new();
        registry
            .register(
                Arc::new(StubRunner::new([Capability::Llm])),
                descriptor("dup", &[Capability::Llm]),
            )
            .await;
        registry
            .register(
                Arc::new(StubRunner::new([Capability::Asr])),
                descriptor("dup", &[Capability::Asr]),
            )
            .await;
        let (_, desc) = registry.get_by_name("dup").await.unwrap();
        assert!(desc.capabilities.contains(&Capability::Asr));
        assert_eq!(registry.len().await, 1);
    }
}
