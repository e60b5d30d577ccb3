//! # One-shot delay timer.
//!
//! A [`Timer`] represents a single pending delay handed out by a
//! [`Clock`](crate::Clock). Its readiness signal becomes available exactly
//! once, at or after the requested duration; a stopped timer never fires.
//!
//! ## Rules
//! - [`Timer::ready`] resolves **at most once**. Racing it again after it has
//!   fired (or after a stop) parks forever; the loops in this crate race each
//!   timer exactly once.
//! - [`Timer::stop`] is idempotent and reports whether the fire was still
//!   pending, releasing the underlying scheduling resource either way.
//! - Dropping an un-fired timer releases its resources too, so a superseded
//!   timer cannot leak its tokio task or fake-clock slot.

use std::future::pending;

use tokio::sync::oneshot;

/// Releases the timer's scheduling resource; returns true if it was still pending.
pub(crate) type StopFn = Box<dyn FnOnce() -> bool + Send>;

/// A single pending delay.
///
/// Created by [`Clock::timer`](crate::Clock::timer) or
/// [`BackoffManager::backoff`](crate::BackoffManager::backoff).
pub struct Timer {
    rx: Option<oneshot::Receiver<()>>,
    stop: Option<StopFn>,
}

impl Timer {
    pub(crate) fn new(rx: oneshot::Receiver<()>, stop: StopFn) -> Self {
        Self {
            rx: Some(rx),
            stop: Some(stop),
        }
    }

    /// Resolves once the requested duration has elapsed.
    ///
    /// One-shot: after the timer has fired or been stopped, this future never
    /// resolves again. Intended to be raced against a cancellation signal, as
    /// [`backoff_until`](crate::backoff_until) does; losing such a race keeps
    /// the timer armed, so `ready()` can be raced again (cancel-safe).
    pub async fn ready(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            let fired = rx.await;
            self.rx = None;
            // Err means the sender side was released by stop(); the contract
            // is "fires exactly once or never", so park.
            if fired.is_ok() {
                return;
            }
        }
        pending::<()>().await
    }

    /// Cancels the pending fire and releases its resources.
    ///
    /// Returns `true` if the timer was still pending, `false` if it had
    /// already fired or was already stopped. Idempotent.
    pub fn stop(&mut self) -> bool {
        match self.stop.take() {
            Some(stop) => stop(),
            None => false,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("consumed", &self.rx.is_none())
            .field("stopped", &self.stop.is_none())
            .finish()
    }
}
