//! C3 — discovery: walks a declarative catalog of runner classes, filters
//! by static support and hardware requirements, instantiates survivors,
//! and hands them to the registry.
//!
//! The source discovers runners by annotation scanning at runtime; spec §9
//! replaces that with a compile-time registered table (no reflection).
//! Each [`CatalogEntry`] pairs a static [`RunnerDescriptor`] with a factory
//! closure, generalizing the teacher's `main.rs` pattern of hand-registering
//! `OllamaEngine`/`LlamaCppEngine` behind `if config.enabled` checks.

use std::sync::Arc;

use engine_common::{HardwareRequirement, RunnerDescriptor};

use crate::contract::RunnerInstance;
use crate::registry::Registry;

/// Host-environment probe consulted for each `hardware_requirements` flag
/// a candidate descriptor declares. A missing requirement skips the
/// runner (logged). Implemented as a trait so discovery is unit-testable
/// with a fake probe.
pub trait HardwareProbe: Send + Sync {
    fn has_mtk_npu(&self) -> bool {
        false
    }
    fn memory_tier(&self) -> MemoryTier;
    fn storage_tier(&self) -> StorageTier;
    fn has_internet(&self) -> bool {
        true
    }
    fn has_microphone(&self) -> bool {
        true
    }
    fn has_camera(&self) -> bool {
        true
    }
    fn has_cpu(&self) -> bool {
        true
    }

    fn satisfies(&self, requirement: HardwareRequirement) -> bool {
        match requirement {
            HardwareRequirement::MtkNpu => self.has_mtk_npu(),
            HardwareRequirement::HighMemory => self.memory_tier() >= MemoryTier::High,
            HardwareRequirement::MediumMemory => self.memory_tier() >= MemoryTier::Medium,
            HardwareRequirement::LowMemory => self.memory_tier() >= MemoryTier::Low,
            HardwareRequirement::LargeStorage => self.storage_tier() >= StorageTier::Large,
            HardwareRequirement::MediumStorage => self.storage_tier() >= StorageTier::Medium,
            HardwareRequirement::Internet => self.has_internet(),
            HardwareRequirement::Microphone => self.has_microphone(),
            HardwareRequirement::Camera => self.has_camera(),
            HardwareRequirement::Cpu => self.has_cpu(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryTier {
    Low = 0,
    Medium = 1,
    High = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StorageTier {
    Medium = 0,
    Large = 1,
}

/// Best-effort probe backed by `/proc/meminfo` on Linux for the memory
/// tier (the only signal with a portable stdlib-reachable source); flags
/// with no such source (microphone, camera, MTK NPU) default to their
/// trait-default rather than guessing.
pub struct DefaultHardwareProbe;

impl HardwareProbe for DefaultHardwareProbe {
    fn memory_tier(&self) -> MemoryTier {
        match read_available_memory_kb() {
            Some(kb) if kb >= 8 * 1024 * 1024 => MemoryTier::High,
            Some(kb) if kb >= 2 * 1024 * 1024 => MemoryTier::Medium,
            Some(_) => MemoryTier::Low,
            None => MemoryTier::Medium,
        }
    }

    fn storage_tier(&self) -> StorageTier {
        StorageTier::Large
    }

    fn has_mtk_npu(&self) -> bool {
        false
    }
}

fn read_available_memory_kb() -> Option<u64> {
    let contents = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
            return digits.parse().ok();
        }
    }
    None
}

/// A factory producing a fresh, unloaded runner instance. Closures let a
/// catalog entry capture constructor context (an HTTP client, a config
/// section) without a separate "context constructor" variant.
pub type Factory = Arc<dyn Fn() -> Arc<dyn RunnerInstance> + Send + Sync>;

/// One declarative catalog record: static metadata plus how to build it.
#[derive(Clone)]
pub struct CatalogEntry {
    pub descriptor: RunnerDescriptor,
    pub factory: Factory,
}

impl CatalogEntry {
    pub fn new(descriptor: RunnerDescriptor, factory: Factory) -> Self {
        Self { descriptor, factory }
    }
}

/// Per-candidate outcome, useful for startup logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Registered,
    SkippedDisabled,
    SkippedUnsupportedHardware(HardwareRequirement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryReport {
    pub name: String,
    pub outcome: Outcome,
}

/// Runs discovery once: for each catalog entry, `enabled == false` skips
/// it; otherwise every `hardware_requirements` flag is checked against
/// `probe`, and the first unsatisfied one skips it (logged); survivors are
/// instantiated and registered. Safe to call again (`reinitialize`) —
/// callers should `registry.clear()` first if they want a clean slate.
pub async fn discover(
    catalog: &[CatalogEntry],
    probe: &dyn HardwareProbe,
    registry: &Registry,
) -> Vec<DiscoveryReport> {
    let mut reports = Vec::with_capacity(catalog.len());

    for entry in catalog {
        let name = entry.descriptor.name.clone();

        if !entry.descriptor.enabled {
            tracing::info!(runner = %name, "skipping disabled runner");
            reports.push(DiscoveryReport {
                name,
                outcome: Outcome::SkippedDisabled,
            });
            continue;
        }

        let mut unmet = None;
        for requirement in &entry.descriptor.hardware_requirements {
            if !probe.satisfies(*requirement) {
                unmet = Some(*requirement);
                break;
            }
        }
        if let Some(requirement) = unmet {
            tracing::info!(runner = %name, ?requirement, "skipping runner, hardware requirement unmet");
            reports.push(DiscoveryReport {
                name,
                outcome: Outcome::SkippedUnsupportedHardware(requirement),
            });
            continue;
        }

        let instance = (entry.factory)();
        registry.register(instance, entry.descriptor.clone()).await;
        tracing::info!(runner = %name, "registered runner");
        reports.push(DiscoveryReport {
            name,
            outcome: Outcome::Registered,
        });
    }

    reports
}

/// Clears the registry and re-runs discovery against the same catalog.
pub async fn reinitialize(
    catalog: &[CatalogEntry],
    probe: &dyn HardwareProbe,
    registry: &Registry,
) -> Vec<DiscoveryReport> {
    registry.clear().await;
    discover(catalog, probe, registry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::test_support::StubRunner;
    use engine_common::{Capability, Priority, Vendor};

    struct FakeProbe {
        internet: bool,
    }
    impl HardwareProbe for FakeProbe {
        fn memory_tier(&self) -> MemoryTier {
            MemoryTier::High
        }
        fn storage_tier(&self) -> StorageTier {
            StorageTier::Large
        }
        fn has_internet(&self) -> bool {
            self.internet
        }
    }

    fn entry(name: &str, enabled: bool, reqs: &[HardwareRequirement]) -> CatalogEntry {
        let descriptor = RunnerDescriptor::new(name, Vendor::Custom, Priority::Normal)
            .with_capabilities([Capability::Llm])
            .with_hardware(reqs.to_vec());
        let descriptor = if enabled { descriptor } else { descriptor.disabled() };
        CatalogEntry::new(descriptor, Arc::new(|| Arc::new(StubRunner::new([Capability::Llm]))))
    }

    #[tokio::test]
    async fn test_discover_registers_supported_runners() {
        let catalog = vec![entry("r1", true, &[])];
        let probe = FakeProbe { internet: true };
        let registry = Registry::new();
        let reports = discover(&catalog, &probe, &registry).await;
        assert_eq!(reports[0].outcome, Outcome::Registered);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_discover_skips_disabled() {
        let catalog = vec![entry("r1", false, &[])];
        let probe = FakeProbe { internet: true };
        let registry = Registry::new();
        let reports = discover(&catalog, &probe, &registry).await;
        assert_eq!(reports[0].outcome, Outcome::SkippedDisabled);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_discover_skips_unmet_hardware() {
        let catalog = vec![entry("r1", true, &[HardwareRequirement::Internet])];
        let probe = FakeProbe { internet: false };
        let registry = Registry::new();
        let reports = discover(&catalog, &probe, &registry).await;
        assert_eq!(
            reports[0].outcome,
            Outcome::SkippedUnsupportedHardware(HardwareRequirement::Internet)
        );
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_reinitialize_clears_before_rediscovering() {
        let catalog = vec![entry("r1", true, &[])];
        let probe = FakeProbe { internet: true };
        let registry = Registry::new();
        discover(&catalog, &probe, &registry).await;
        assert_eq!(registry.len().await, 1);

        reinitialize(&catalog, &probe, &registry).await;
        assert_eq!(registry.len().await, 1);
    }
}
