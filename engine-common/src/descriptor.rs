//! Static runner metadata extracted at discovery time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Vendor family a runner belongs to. Used only to break selection ties
/// deterministically (see [`crate::descriptor::Priority`] and the priority
/// resolver in `engine-core`); it carries no behavioral meaning here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vendor {
    Mediatek,
    Executorch,
    Sherpa,
    Openrouter,
    Llamastack,
    Custom,
    Unknown,
}

impl Vendor {
    /// Stable ordering index used by the priority resolver's
    /// `vendor_index * 10 + priority` score. Lower sorts first.
    pub fn index(&self) -> u32 {
        match self {
            Vendor::Mediatek => 0,
            Vendor::Executorch => 1,
            Vendor::Sherpa => 2,
            Vendor::Openrouter => 3,
            Vendor::Llamastack => 4,
            Vendor::Custom => 5,
            Vendor::Unknown => 6,
        }
    }
}

/// Runner priority tier. Lower is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High = 0,
    Normal = 1,
    Low = 2,
}

impl Priority {
    pub fn value(&self) -> u32 {
        *self as u32
    }
}

/// Host capability flags a runner declares it needs. Discovery skips a
/// runner whose requirements the host does not satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HardwareRequirement {
    MtkNpu,
    HighMemory,
    MediumMemory,
    LowMemory,
    LargeStorage,
    MediumStorage,
    Internet,
    Microphone,
    Camera,
    Cpu,
}

/// The type of value a runner parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Integer,
    Float,
    Boolean,
    Enum,
}

/// Describes one tunable parameter a runner instance accepts, surfaced to
/// clients/UI via introspection and consulted by `validate_parameters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Free-form constraint description (e.g. "0.0..=2.0", "one of: en,zh").
    #[serde(default)]
    pub constraints: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    /// Sensitive parameters (API keys, tokens) are never echoed back in
    /// introspection responses.
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub category: Option<String>,
}

/// Static metadata about a runner class, extracted at discovery time.
///
/// Invariant: `name` is globally unique. Two descriptors with the same
/// `name` collide; the later registration wins (and the collision is
/// logged by the registry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerDescriptor {
    pub name: String,
    pub vendor: Vendor,
    pub priority: Priority,
    pub capabilities: HashSet<Capability>,
    pub hardware_requirements: HashSet<HardwareRequirement>,
    pub enabled: bool,
    #[serde(default)]
    pub default_model_id: Option<String>,
    /// Reserved for future protocol evolution; not interpreted by the
    /// runtime today.
    #[serde(default)]
    pub api_level: i32,
}

impl RunnerDescriptor {
    pub fn new(name: impl Into<String>, vendor: Vendor, priority: Priority) -> Self {
        Self {
            name: name.into(),
            vendor,
            priority,
            capabilities: HashSet::new(),
            hardware_requirements: HashSet::new(),
            enabled: true,
            default_model_id: None,
            api_level: 1,
        }
    }

    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = caps.into_iter().collect();
        self
    }

    pub fn with_hardware(mut self, reqs: impl IntoIterator<Item = HardwareRequirement>) -> Self {
        self.hardware_requirements = reqs.into_iter().collect();
        self
    }

    pub fn with_default_model_id(mut self, id: impl Into<String>) -> Self {
        self.default_model_id = Some(id.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// `score = vendor_index * 10 + priority_value`; lower is better.
    pub fn score(&self) -> u32 {
        self.vendor.index() * 10 + self.priority.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_score_orders_by_vendor_then_priority() {
        let mtk_low = RunnerDescriptor::new("a", Vendor::Mediatek, Priority::Low);
        let custom_high = RunnerDescriptor::new("b", Vendor::Custom, Priority::High);
        assert!(mtk_low.score() < custom_high.score());
    }

    #[test]
    fn test_descriptor_serialization_roundtrip() {
        let d = RunnerDescriptor::new("x", Vendor::Sherpa, Priority::Normal)
            .with_capabilities([Capability::Asr])
            .with_hardware([HardwareRequirement::Microphone]);
        let json = serde_json::to_string(&d).unwrap();
        let back: RunnerDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "x");
        assert!(back.capabilities.contains(&Capability::Asr));
    }
}
