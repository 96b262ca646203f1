//! Request lifecycle shared by every AI-backed operation.
//!
//! A `RequestLifecycle` gives callers one observable state per logical
//! operation: idle, in flight, succeeded or failed. Each start issues a
//! monotonically increasing ticket; an outcome is applied only while its
//! ticket is still the latest one, so a superseded call that settles late
//! can never overwrite a newer result. Nothing is cancelled and nothing is
//! retried.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::AiError;

/// Observable state of one logical operation.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    InFlight,
    Succeeded(T),
    Failed(AiError),
}

impl<T> RequestState<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            RequestState::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AiError> {
        match self {
            RequestState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Token identifying one start of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

struct Inner<T> {
    state: watch::Sender<RequestState<T>>,
    latest: AtomicU64,
}

/// State machine wrapping asynchronous operations. Clones share state.
pub struct RequestLifecycle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestLifecycle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RequestLifecycle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestLifecycle<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            inner: Arc::new(Inner {
                state,
                latest: AtomicU64::new(0),
            }),
        }
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.inner.state.subscribe()
    }

    /// Issue a new ticket and move to `InFlight`. Any earlier ticket becomes stale.
    pub fn begin(&self) -> Ticket {
        let mut ticket = Ticket(0);
        self.inner.state.send_modify(|state| {
            ticket = Ticket(self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1);
            *state = RequestState::InFlight;
        });
        ticket
    }

    /// Whether `ticket` is still the most recently issued one.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.inner.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Apply an outcome if `ticket` is still current.
    ///
    /// Returns false, leaving the state untouched, for stale tickets.
    pub fn settle(&self, ticket: Ticket, outcome: Result<T, AiError>) -> bool {
        let applied = self.inner.state.send_if_modified(|state| {
            if self.inner.latest.load(Ordering::SeqCst) != ticket.0 {
                return false;
            }
            *state = match outcome {
                Ok(data) => RequestState::Succeeded(data),
                Err(error) => RequestState::Failed(error),
            };
            true
        });

        if !applied {
            tracing::debug!(ticket = ticket.0, "Discarding stale request outcome");
        }
        applied
    }

    /// Return to `Idle` and invalidate outstanding tickets.
    ///
    /// Work already running is not aborted; its outcome will be discarded.
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            self.inner.latest.fetch_add(1, Ordering::SeqCst);
            *state = RequestState::Idle;
        });
    }
}

impl<T: Clone> RequestLifecycle<T> {
    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<T> {
        self.inner.state.borrow().clone()
    }

    /// Run `operation` to completion under a fresh ticket.
    ///
    /// The state becomes `InFlight` when the returned future is first polled.
    /// The outcome is returned to the caller even if it was stale.
    pub async fn run<F>(&self, operation: F) -> Result<T, AiError>
    where
        F: Future<Output = Result<T, AiError>>,
    {
        let ticket = self.begin();
        let outcome = operation.await;
        self.settle(ticket, outcome.clone());
        outcome
    }
}

impl<T> RequestLifecycle<T>
where
    T: Send + Sync + 'static,
{
    /// Move to `InFlight` now and drive `operation` on the tokio runtime.
    ///
    /// The handle resolves to whether the outcome was applied.
    pub fn start<F>(&self, operation: F) -> JoinHandle<bool>
    where
        F: Future<Output = Result<T, AiError>> + Send + 'static,
    {
        let ticket = self.begin();
        let lifecycle = self.clone();
        tokio::spawn(async move {
            let outcome = operation.await;
            lifecycle.settle(ticket, outcome)
        })
    }
}
