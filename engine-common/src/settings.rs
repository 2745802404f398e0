//! Persistent engine settings: per-capability runner selection and
//! per-runner parameter overrides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::Capability;

/// `{selected_runners, runner_parameters}` — the exact two-key persisted
/// state layout from spec §6. No field is required; missing entries fall
/// back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    #[serde(default)]
    pub selected_runners: HashMap<Capability, String>,
    #[serde(default)]
    pub runner_parameters: HashMap<String, HashMap<String, Value>>,
}

impl EngineSettings {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn selected_runner(&self, capability: Capability) -> Option<&str> {
        self.selected_runners.get(&capability).map(String::as_str)
    }

    pub fn parameters_for(&self, runner: &str) -> HashMap<String, Value> {
        self.runner_parameters.get(runner).cloned().unwrap_or_default()
    }

    /// Runner names whose effective parameters differ between `self` (old)
    /// and `other` (new), used by the reload manager (C7).
    pub fn changed_runner_parameters(&self, other: &EngineSettings) -> Vec<String> {
        let mut changed = Vec::new();
        let mut names: Vec<&String> = self
            .runner_parameters
            .keys()
            .chain(other.runner_parameters.keys())
            .collect();
        names.sort();
        names.dedup();
        for name in names {
            if self.runner_parameters.get(name) != other.runner_parameters.get(name) {
                changed.push(name.clone());
            }
        }
        changed
    }

    /// Capabilities whose selected runner changed between `self` and `other`.
    pub fn changed_default_selections(&self, other: &EngineSettings) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.selected_runner(*c) != other.selected_runner(*c))
            .collect()
    }
}
