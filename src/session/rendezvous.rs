// Rendezvous - One-shot, fire-once synchronization point
//
// The frame loop signals it exactly once when shutdown has completed; any
// number of threads may block on it. Signaling twice is a no-op.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Rendezvous {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl Rendezvous {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the rendezvous
    ///
    /// Returns `true` for the call that fired it and `false` for every
    /// later call.
    pub fn signal(&self) -> bool {
        let mut signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        if *signaled {
            return false;
        }
        *signaled = true;
        self.cond.notify_all();
        true
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the rendezvous has fired
    pub fn wait(&self) {
        let guard = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        let _fired = self
            .cond
            .wait_while(guard, |signaled| !*signaled)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block until the rendezvous has fired or `timeout` elapses
    ///
    /// Returns whether it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        while !*signaled {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            signaled = self
                .cond
                .wait_timeout(signaled, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}
