//! C9 — service-state publisher: a single source of truth for what the
//! engine is doing right now, broadcast to any number of subscribers.
//!
//! Backed by `tokio::sync::watch`: a new subscriber's first `recv()`
//! observes whatever the current value is, which is exactly the "new
//! subscribers see current state immediately" requirement (spec.md §6) —
//! no replay buffer or extra bookkeeping needed.

use engine_common::ServiceState;
use tokio::sync::watch;

pub struct StatePublisher {
    tx: watch::Sender<ServiceState>,
}

impl StatePublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ServiceState::Ready);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ServiceState {
        self.tx.borrow().clone()
    }

    pub fn set(&self, state: ServiceState) {
        // A `watch::Sender::send` only errs when every receiver (including
        // the one the sender itself would create) has been dropped; there
        // is always at least the publisher's own borrow, so this can't
        // fail in practice. Ignored rather than unwrapped to avoid
        // panicking on a future refactor that drops the invariant.
        let _ = self.tx.send(state);
    }

    /// Convenience for the coordinator's active-request bracketing:
    /// publishes `Processing { active_count }` (or `Ready` at zero).
    pub fn set_active_count(&self, active_count: u32) {
        self.set(ServiceState::processing(active_count));
    }
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_subscriber_sees_current_state_immediately() {
        let publisher = StatePublisher::new();
        publisher.set_active_count(2);

        let rx = publisher.subscribe();
        assert_eq!(*rx.borrow(), ServiceState::Processing { active_count: 2 });
    }

    #[tokio::test]
    async fn test_subscribers_observe_subsequent_updates() {
        let publisher = StatePublisher::new();
        let mut rx = publisher.subscribe();

        publisher.set_active_count(1);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ServiceState::Processing { active_count: 1 });

        publisher.set_active_count(0);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ServiceState::Ready);
    }

    #[tokio::test]
    async fn test_error_state_is_published() {
        let publisher = StatePublisher::new();
        publisher.set(ServiceState::Error {
            message: "boom".to_string(),
            recoverable: true,
        });
        assert!(!publisher.current().is_ready());
    }
}
