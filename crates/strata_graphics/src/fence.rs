//! CPU-visible fence for GPU work completion.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// One-shot signal crossing from the device side to a waiting CPU thread.
///
/// Cloned handles observe the same signal. Once signaled, a fence stays
/// signaled.
#[derive(Clone, Default)]
pub struct Fence {
    inner: Arc<FenceInner>,
}

#[derive(Default)]
struct FenceInner {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl Fence {
    /// Creates an unsignaled fence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals the fence and wakes every waiter.
    pub fn signal(&self) {
        let mut signaled = self.inner.signaled.lock();
        *signaled = true;
        self.inner.condvar.notify_all();
    }

    /// Whether the fence has been signaled.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        *self.inner.signaled.lock()
    }

    /// Waits up to `timeout` for the signal.
    ///
    /// Returns `true` if the fence was signaled within the timeout. A zero
    /// timeout is a poll: the current state, never a block.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut signaled = self.inner.signaled.lock();
        if *signaled {
            return true;
        }
        if timeout.is_zero() {
            return false;
        }
        self.inner
            .condvar
            .wait_while_for(&mut signaled, |s| !*s, timeout);
        *signaled
    }
}
