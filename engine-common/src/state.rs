//! Service state: the single source of truth for what the engine is doing.

use serde::{Deserialize, Serialize};

/// `Ready | Processing(n) | Downloading(id, pct) | Error(msg, recoverable)`.
///
/// The publisher guarantees `active_count` is monotone non-decreasing while
/// `Processing`, and that `Processing { active_count: 0 }` collapses to
/// `Ready` (see `engine-core::state_publisher`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServiceState {
    Ready,
    Processing { active_count: u32 },
    Downloading {
        id: String,
        percent: f32,
        #[serde(default)]
        size_bytes: Option<u64>,
    },
    Error { message: String, recoverable: bool },
}

impl ServiceState {
    pub fn processing(active_count: u32) -> Self {
        if active_count == 0 {
            ServiceState::Ready
        } else {
            ServiceState::Processing { active_count }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ServiceState::Ready)
    }

    pub fn active_count(&self) -> u32 {
        match self {
            ServiceState::Processing { active_count } => *active_count,
            _ => 0,
        }
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        ServiceState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_zero_collapses_to_ready() {
        assert_eq!(ServiceState::processing(0), ServiceState::Ready);
    }

    #[test]
    fn test_processing_nonzero_stays_processing() {
        assert_eq!(
            ServiceState::processing(3),
            ServiceState::Processing { active_count: 3 }
        );
    }

    #[test]
    fn test_serialization_tag() {
        let json = serde_json::to_string(&ServiceState::Ready).unwrap();
        assert_eq!(json, r#"{"state":"ready"}"#);
    }
}
