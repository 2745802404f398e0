//! The compile-time runner catalog (spec.md §4.3 / §9): the direct
//! generalization of the teacher's `main.rs`, which hand-registers
//! `OllamaEngine`/`LlamaCppEngine` behind `if config.engines.*.enabled`
//! checks, into a table discovery iterates once.

use std::sync::Arc;

use engine_common::{Capability, HardwareRequirement, Priority, RunnerDescriptor, Vendor};
use engine_core::runners::{EchoLlmRunner, KeywordGuardianRunner, LocalAsrRunner, LocalTtsRunner};
use engine_core::{CatalogEntry, RunnerInstance};

use crate::config::RunnersConfig;

pub fn builtin_catalog(config: &RunnersConfig) -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(
            enable_if(
                RunnerDescriptor::new("echo-llm", Vendor::Custom, Priority::Normal)
                    .with_capabilities([Capability::Llm])
                    .with_default_model_id("echo-v1"),
                config.echo_llm,
            ),
            Arc::new(|| Arc::new(EchoLlmRunner::new()) as Arc<dyn RunnerInstance>),
        ),
        CatalogEntry::new(
            enable_if(
                RunnerDescriptor::new("local-asr", Vendor::Sherpa, Priority::Normal)
                    .with_capabilities([Capability::Asr])
                    .with_hardware([HardwareRequirement::Microphone])
                    .with_default_model_id("local-asr-v1"),
                config.local_asr,
            ),
            Arc::new(|| Arc::new(LocalAsrRunner::new()) as Arc<dyn RunnerInstance>),
        ),
        CatalogEntry::new(
            enable_if(
                RunnerDescriptor::new("local-tts", Vendor::Sherpa, Priority::Normal)
                    .with_capabilities([Capability::Tts])
                    .with_default_model_id("local-tts-v1"),
                config.local_tts,
            ),
            Arc::new(|| Arc::new(LocalTtsRunner::new()) as Arc<dyn RunnerInstance>),
        ),
        CatalogEntry::new(
            enable_if(
                RunnerDescriptor::new("keyword-guardian", Vendor::Custom, Priority::Normal)
                    .with_capabilities([Capability::Guardian])
                    .with_default_model_id("keyword-guardian-v1"),
                config.guardian,
            ),
            Arc::new(|| Arc::new(KeywordGuardianRunner::default()) as Arc<dyn RunnerInstance>),
        ),
    ]
}

fn enable_if(descriptor: RunnerDescriptor, enabled: bool) -> RunnerDescriptor {
    if enabled {
        descriptor
    } else {
        descriptor.disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_one_entry_per_capability() {
        let catalog = builtin_catalog(&RunnersConfig::default());
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_disabling_a_runner_marks_descriptor_disabled() {
        let config = RunnersConfig {
            echo_llm: false,
            local_asr: true,
            local_tts: true,
            guardian: true,
        };
        let catalog = builtin_catalog(&config);
        let echo = catalog.iter().find(|e| e.descriptor.name == "echo-llm").unwrap();
        assert!(!echo.descriptor.enabled);
    }
}
