//! Delay policies for retry and poll loops.
//!
//! This module groups the knobs that control **how long** to wait between
//! iterations of a periodic loop.
//!
//! ## Contents
//! - [`BackoffManager`] — stateful policy producing one delay [`Timer`] per call
//! - [`ExponentialBackoff`] — grow-by-factor delays with a cap and an
//!   inactivity reset
//! - [`JitteredBackoff`] — independent, identically distributed delays around
//!   a base period
//!
//! ## Quick wiring
//! ```text
//! ExponentialBackoff / JitteredBackoff
//!      └─► wait::backoff_until uses:
//!           - manager.backoff() to obtain the next delay timer
//!           - the timer raced against the loop's CancellationToken
//! ```
//!
//! A manager is single-owner by construction: [`BackoffManager::backoff`]
//! takes `&mut self`, so sharing one across loops requires explicit caller-side
//! serialization (and is not recommended).

mod exponential;
mod jittered;

pub use exponential::ExponentialBackoff;
pub use jittered::JitteredBackoff;

use std::time::Duration;

use rand::Rng;

use crate::clock::Timer;

/// # Stateful delay policy.
///
/// Each [`backoff`](Self::backoff) call advances internal policy state and
/// returns a [`Timer`] configured to fire after the computed delay. Calls are
/// not idempotent.
pub trait BackoffManager: Send {
    /// Computes the next delay and returns a timer for it.
    fn backoff(&mut self) -> Timer;
}

/// Perturbs `duration` into `[duration, duration * (1 + factor))`.
///
/// Returns the input unchanged when the spread rounds to nothing (zero
/// duration or non-positive factor).
pub(crate) fn jitter(duration: Duration, factor: f64, rng: &mut impl Rng) -> Duration {
    let spread = duration.as_secs_f64() * factor;
    if !spread.is_finite() || spread <= 0.0 {
        return duration;
    }
    let extra = Duration::from_secs_f64(rng.random_range(0.0..spread));
    duration.checked_add(extra).unwrap_or(Duration::MAX)
}
