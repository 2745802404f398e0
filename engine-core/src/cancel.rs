//! Cooperative cancellation: a flag consulted at emission boundaries.
//!
//! Per spec §5, the core imposes no wall-clock timeout and cancellation is
//! cooperative — runners check a shared flag between emissions and at
//! heavy compute steps. `CancelToken` is that flag, cheap to clone and
//! share between the coordinator (which flips it) and a runner's
//! `run_as_flow` (which polls it).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_observed_through_clone() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
