// crates/provisioner-core/src/runtime/context.rs
// ============================================================================
// Module: Provisioner Request Context
// Description: Cancellation and deadline scope for lifecycle calls.
// Purpose: Let callers abandon blocking waits without touching job state.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A [`RequestContext`] travels with every lifecycle call. It carries zero or
//! more cancellation signals (one per derived scope) and an optional
//! deadline. Deriving a child scope keeps the parent's signals, so cancelling
//! a parent also cancels every context derived from it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Cancellable execution scope of one broker request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Cancellation signals inherited from every enclosing scope.
    signals: Vec<watch::Receiver<bool>>,
    /// Point in time after which the context counts as cancelled.
    deadline: Option<Instant>,
    /// Correlation identifier for logs.
    request_id: Option<String>,
}

impl RequestContext {
    /// Returns a context that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a child context with its own cancellation handle.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let mut child = self.clone();
        child.signals.push(receiver);
        (
            child,
            CancelHandle {
                sender: Arc::new(sender),
            },
        )
    }

    /// Derives a child context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a child context that expires at `deadline`.
    ///
    /// An earlier inherited deadline is kept.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        child
    }

    /// Attaches a correlation identifier.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns the correlation identifier, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns the effective deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once any signal fired or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signals.iter().any(|signal| *signal.borrow())
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a background context.
    pub async fn cancelled(&self) {
        let signals = any_signal(&self.signals);
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = signals => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signals.await,
        }
    }
}

// ============================================================================
// SECTION: Cancel Handle
// ============================================================================

/// Handle that cancels the context it was created with.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    /// Sending half of the scope's signal.
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancels the associated context and every context derived from it.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

// ============================================================================
// SECTION: Signal Helpers
// ============================================================================

/// Boxed future borrowed from a signal slice.
type SignalFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Resolves when any signal fires; pending forever for an empty slice.
fn any_signal(signals: &[watch::Receiver<bool>]) -> SignalFuture<'_> {
    Box::pin(async move {
        match signals {
            [] => std::future::pending::<()>().await,
            [only] => wait_signal(only.clone()).await,
            [first, rest @ ..] => {
                tokio::select! {
                    () = wait_signal(first.clone()) => {}
                    () = any_signal(rest) => {}
                }
            }
        }
    })
}

/// Resolves when the signal fires; a dropped sender never fires.
async fn wait_signal(mut signal: watch::Receiver<bool>) {
    let fired = signal.wait_for(|cancelled| *cancelled).await.is_ok();
    if !fired {
        std::future::pending::<()>().await;
    }
}
