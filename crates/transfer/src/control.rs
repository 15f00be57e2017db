//! Caller-side control of a running transfer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cooperative stop signal for one transfer.
///
/// The caller holds one clone and the worker another; these two flags are
/// the only state shared across threads. [`pause`](Self::pause) raises the
/// cancel flag too (that is what actually stops the in-flight attempt);
/// the pause flag records which terminal state the session reports.
#[derive(Clone, Default)]
pub struct TransferControl {
    inner: Arc<Flags>,
}

#[derive(Default)]
struct Flags {
    cancel: AtomicBool,
    pause: AtomicBool,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a hard cancel: the session ends as cancelled and the caller
    /// should discard any resume state.
    pub fn cancel(&self) {
        self.inner.pause.store(false, Ordering::Release);
        self.inner.cancel.store(true, Ordering::Release);
    }

    /// Requests a pause: the session ends as paused and reports a
    /// [`ResumePoint`] for a future instance.
    pub fn pause(&self) {
        self.inner.pause.store(true, Ordering::Release);
        self.inner.cancel.store(true, Ordering::Release);
    }

    /// Whether the current attempt must stop. Checked by the worker at
    /// every chunk boundary and after the retry sleep.
    pub fn cancel_requested(&self) -> bool {
        self.inner.cancel.load(Ordering::Acquire)
    }

    /// Whether the stop was a pause rather than a hard cancel.
    pub fn pause_requested(&self) -> bool {
        self.inner.pause.load(Ordering::Acquire)
    }
}

/// Resume state a paused transfer hands back to its caller.
///
/// Held by the caller as plain values and passed into the next task
/// instance; the engine itself persists nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    /// Bytes already transferred in previous run segments.
    pub bytes: u64,
    /// Wall-clock time accumulated across previous run segments.
    pub elapsed: Duration,
}
