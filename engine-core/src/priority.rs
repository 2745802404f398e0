//! C4 — priority resolver: deterministic ordering among candidates for a
//! capability.

use engine_common::RunnerDescriptor;

/// Picks the minimum-score candidate (`vendor_index * 10 + priority`,
/// lower wins), breaking ties by descriptor name ascending. Stateless and
/// deterministic: the same `candidates` slice always yields the same
/// choice (see spec's "selection determinism" testable property).
///
/// Returns `None` only if `candidates` is empty; the engine manager is
/// responsible for turning that into an `E404`.
pub fn resolve(candidates: &[RunnerDescriptor]) -> Option<&RunnerDescriptor> {
    candidates
        .iter()
        .min_by(|a, b| a.score().cmp(&b.score()).then_with(|| a.name.cmp(&b.name)))
}
