//! Capability types for the inference engine runtime.

use serde::{Deserialize, Serialize};

/// A semantic category of workload. Identifies the *shape* of input/output
/// a runner promises, not its vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Text generation (chat).
    Llm,
    /// Vision-language (text + image) generation.
    Vlm,
    /// Automatic speech recognition.
    Asr,
    /// Text-to-speech synthesis.
    Tts,
    /// Content-safety / guardrail classification.
    Guardian,
}

impl Capability {
    /// All capability variants for iteration.
    pub const ALL: [Capability; 5] = [
        Capability::Llm,
        Capability::Vlm,
        Capability::Asr,
        Capability::Tts,
        Capability::Guardian,
    ];
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Llm => write!(f, "llm"),
            Capability::Vlm => write!(f, "vlm"),
            Capability::Asr => write!(f, "asr"),
            Capability::Tts => write!(f, "tts"),
            Capability::Guardian => write!(f, "guardian"),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "llm" => Ok(Capability::Llm),
            "vlm" => Ok(Capability::Vlm),
            "asr" => Ok(Capability::Asr),
            "tts" => Ok(Capability::Tts),
            "guardian" => Ok(Capability::Guardian),
            other => Err(format!("unknown capability: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_serialization() {
        let cap = Capability::Asr;
        let json = serde_json::to_string(&cap).unwrap();
        assert_eq!(json, r#""asr""#);

        let parsed: Capability = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Capability::Asr);
    }

    #[test]
    fn test_capability_display_roundtrips_through_from_str() {
        for cap in Capability::ALL {
            let s = cap.to_string();
            assert_eq!(s.parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn test_capability_from_str_unknown() {
        assert!("nope".parse::<Capability>().is_err());
    }
}
