//! C6 — request coordinator: the thin layer between ingress and the engine
//! manager. Stamps every request with a fresh id, brackets it against the
//! service-state publisher's `active_count`, and — for streams — guarantees
//! exactly one terminal frame reaches the caller, synthesizing an `E101`
//! "stream ended without completion" frame if the runner's stream closes
//! without ever emitting one (a defensive backstop; well-behaved runners
//! never trigger it).

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use engine_common::{Capability, Request, Result as EngineResult, RunnerError};
use futures::Stream;
use uuid::Uuid;

use crate::contract::ResultStream;
use crate::manager::EngineManager;
use crate::state_publisher::StatePublisher;

pub struct Coordinator {
    manager: Arc<EngineManager>,
    state: Arc<StatePublisher>,
    active: Arc<AtomicU32>,
}

impl Coordinator {
    pub fn new(manager: Arc<EngineManager>, state: Arc<StatePublisher>) -> Self {
        Self {
            manager,
            state,
            active: Arc::new(AtomicU32::new(0)),
        }
    }

    fn enter(&self) {
        let n = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.set_active_count(n);
    }

    fn exit(&self) {
        let n = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        self.state.set_active_count(n);
    }

    /// One-shot path. Returns the id stamped onto this request alongside
    /// its result.
    pub async fn process(&self, capability: Capability, preferred: Option<&str>, request: Request) -> (String, EngineResult) {
        let request_id = Uuid::new_v4().to_string();
        tracing::info!(request_id = %request_id, %capability, preferred = preferred.unwrap_or(""), "processing request");
        self.enter();
        let result = self.manager.process(capability, preferred, &request).await;
        self.exit();
        if let Some(err) = &result.error {
            tracing::warn!(request_id = %request_id, code = %err.code, "request failed");
        }
        (request_id, result)
    }

    /// Streaming path. Returns the id stamped onto this request (also the
    /// key `cancel()` expects) alongside its stream.
    pub async fn process_stream(
        &self,
        capability: Capability,
        preferred: Option<&str>,
        request: Request,
    ) -> (String, ResultStream) {
        let request_id = Uuid::new_v4().to_string();
        tracing::info!(request_id = %request_id, %capability, preferred = preferred.unwrap_or(""), "starting stream");
        self.enter();

        let inner = self
            .manager
            .process_stream(capability, preferred, request, request_id.clone())
            .await;

        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            state: Arc::clone(&self.state),
            done: AtomicBool::new(false),
        };
        let stream = CoordinatedStream {
            inner,
            manager: Arc::clone(&self.manager),
            request_id: request_id.clone(),
            seen_terminal: false,
            ended: false,
            guard,
        };
        (request_id, Box::pin(stream))
    }

    /// Delegates to the engine manager's cancellation handle lookup.
    pub fn cancel(&self, request_id: &str) -> bool {
        self.manager.cancel(request_id)
    }

    pub fn active_count(&self) -> u32 {
        self.active.load(Ordering::SeqCst)
    }

    pub fn manager(&self) -> &Arc<EngineManager> {
        &self.manager
    }
}

/// Decrements the shared active-request counter exactly once, whenever the
/// stream it's attached to stops being polled — on natural completion or
/// on early drop (consumer disconnect).
struct ActiveGuard {
    active: Arc<AtomicU32>,
    state: Arc<StatePublisher>,
    done: AtomicBool,
}

impl ActiveGuard {
    fn finish(&self) {
        if !self.done.swap(true, Ordering::SeqCst) {
            let n = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
            self.state.set_active_count(n);
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.finish();
    }
}

struct CoordinatedStream {
    inner: ResultStream,
    manager: Arc<EngineManager>,
    request_id: String,
    seen_terminal: bool,
    ended: bool,
    guard: ActiveGuard,
}

impl Stream for CoordinatedStream {
    type Item = EngineResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.ended {
            return Poll::Ready(None);
        }
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(frame)) => {
                if !frame.partial {
                    self.seen_terminal = true;
                    self.guard.finish();
                }
                Poll::Ready(Some(frame))
            }
            Poll::Ready(None) => {
                self.ended = true;
                self.guard.finish();
                if self.seen_terminal {
                    Poll::Ready(None)
                } else if self.manager.was_cancelled(&self.request_id) {
                    // A cancelled stream is not an error to the client: it
                    // simply stops, with no further Result delivered.
                    tracing::info!(request_id = %self.request_id, "stream ended by cancellation");
                    Poll::Ready(None)
                } else {
                    tracing::warn!(request_id = %self.request_id, "stream ended without a terminal result");
                    Poll::Ready(Some(EngineResult::failed(RunnerError::runtime(
                        "stream ended without completion",
                    ))))
                }
            }
        }
    }
}
