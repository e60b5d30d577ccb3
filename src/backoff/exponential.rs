//! # Exponential backoff with a cap and an inactivity reset.
//!
//! [`ExponentialBackoff`] grows the delay by a constant factor on every call,
//! clamps it to a maximum, and starts over from the initial delay after a
//! configurable quiet period. It is parameterized by:
//! - `initial` — the first delay;
//! - `max` — the delay cap;
//! - `reset_duration` — time since the previous call after which the sequence
//!   restarts from `initial`;
//! - `factor` — the multiplicative growth per step (must be `> 1.0`);
//! - `jitter` — per-step randomization fraction (`0.0` = deterministic).
//!
//! Jitter perturbs only the delay that is handed out; the stored base used for
//! the next step stays jitter-free, so randomness never compounds across
//! steps and the sequence cannot drift away from its nominal shape.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use waitloop::{backoff_until, CancellationToken, ExponentialBackoff, RealClock};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), waitloop::ConfigError> {
//!     // 2s, 4s, 8s, 16s, 20s, 20s, ... between poll attempts; the sequence
//!     // restarts from 2s after two quiet minutes.
//!     let mut manager = ExponentialBackoff::new(
//!         Duration::from_secs(2),
//!         Duration::from_secs(20),
//!         Duration::from_secs(120),
//!         2.0,
//!         0.0,
//!         Arc::new(RealClock),
//!     )?;
//!
//!     let token = CancellationToken::new();
//!     backoff_until(|| async { /* poll */ }, &mut manager, true, token).await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::trace;

use crate::backoff::{BackoffManager, jitter};
use crate::clock::{Clock, Timer};
use crate::error::ConfigError;

/// Backoff manager whose delays grow by `factor` per call, capped at `max`.
///
/// Single-owner: state mutates on every [`backoff`](BackoffManager::backoff)
/// call and the `&mut self` receiver makes concurrent use a compile error
/// rather than a data race.
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    reset_duration: Duration,
    factor: f64,
    jitter: f64,

    /// Jitter-free base for the next call; invariant: within `[initial, max]`.
    current: Duration,
    last_backoff_start: Instant,

    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl ExponentialBackoff {
    /// Creates a manager with an OS-seeded random source.
    ///
    /// Validation is fail-fast; see [`ConfigError`] for the rejected shapes.
    pub fn new(
        initial: Duration,
        max: Duration,
        reset_duration: Duration,
        factor: f64,
        jitter: f64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(
            initial,
            max,
            reset_duration,
            factor,
            jitter,
            clock,
            StdRng::from_os_rng(),
        )
    }

    /// Creates a manager with an explicit random source.
    ///
    /// A seeded [`StdRng`] makes jittered delay sequences reproducible, which
    /// is how the jitter tests below pin their bounds.
    pub fn with_rng(
        initial: Duration,
        max: Duration,
        reset_duration: Duration,
        factor: f64,
        jitter: f64,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        if !factor.is_finite() || factor <= 1.0 {
            return Err(ConfigError::Factor { factor });
        }
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(ConfigError::Jitter { jitter });
        }
        if initial.is_zero() {
            return Err(ConfigError::ZeroInitial);
        }
        if max < initial {
            return Err(ConfigError::MaxBelowInitial { initial, max });
        }

        let last_backoff_start = clock.now();
        Ok(Self {
            initial,
            max,
            reset_duration,
            factor,
            jitter,
            current: initial,
            last_backoff_start,
            clock,
            rng,
        })
    }

    /// Advances the policy one step and returns the delay to wait.
    ///
    /// The returned delay is the pre-advance base (the first call yields
    /// `initial`); the stored base then grows by `factor`, clamped to `max`.
    fn next_delay(&mut self) -> Duration {
        let now = self.clock.now();
        if now.duration_since(self.last_backoff_start) > self.reset_duration {
            trace!(reset = ?self.reset_duration, "idle window exceeded; backoff restarts from initial");
            self.current = self.initial;
        }
        self.last_backoff_start = now;

        let delay = self.current;

        // f64 math so a large factor saturates at the cap instead of
        // overflowing Duration arithmetic.
        let grown = self.current.as_secs_f64() * self.factor;
        self.current = if !grown.is_finite() || grown >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(grown)
        };

        if self.jitter > 0.0 {
            jitter(delay, self.jitter, &mut self.rng)
        } else {
            delay
        }
    }
}

impl BackoffManager for ExponentialBackoff {
    fn backoff(&mut self) -> Timer {
        let delay = self.next_delay();
        trace!(?delay, "scheduling exponential backoff");
        self.clock.timer(delay)
    }
}

impl std::fmt::Debug for ExponentialBackoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExponentialBackoff")
            .field("initial", &self.initial)
            .field("max", &self.max)
            .field("reset_duration", &self.reset_duration)
            .field("factor", &self.factor)
            .field("jitter", &self.jitter)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    fn manager(clock: &FakeClock, reset: Duration, jitter: f64) -> ExponentialBackoff {
        ExponentialBackoff::with_rng(
            Duration::from_secs(2),
            Duration::from_secs(20),
            reset,
            2.0,
            jitter,
            Arc::new(clock.clone()),
            StdRng::seed_from_u64(42),
        )
        .expect("valid config")
    }

    #[test]
    fn doubles_until_capped() {
        let clock = FakeClock::new(Instant::now());
        let mut mgr = manager(&clock, Duration::MAX, 0.0);

        let expected = [2u64, 4, 8, 16, 20, 20, 20];
        for (i, secs) in expected.into_iter().enumerate() {
            assert_eq!(
                mgr.next_delay(),
                Duration::from_secs(secs),
                "call {i} out of sequence"
            );
        }
    }

    #[test]
    fn quiet_period_resets_to_initial() {
        let clock = FakeClock::new(Instant::now());
        let mut mgr = manager(&clock, Duration::from_secs(10), 0.0);

        assert_eq!(mgr.next_delay(), Duration::from_secs(2));
        clock.advance(Duration::from_secs(3));
        assert_eq!(mgr.next_delay(), Duration::from_secs(4));

        // longer than reset_duration since the previous call
        clock.advance(Duration::from_secs(11));
        assert_eq!(mgr.next_delay(), Duration::from_secs(2));
        clock.advance(Duration::from_secs(3));
        assert_eq!(mgr.next_delay(), Duration::from_secs(4));
    }

    #[test]
    fn exactly_reset_duration_does_not_reset() {
        let clock = FakeClock::new(Instant::now());
        let mut mgr = manager(&clock, Duration::from_secs(10), 0.0);

        assert_eq!(mgr.next_delay(), Duration::from_secs(2));
        clock.advance(Duration::from_secs(10));
        assert_eq!(mgr.next_delay(), Duration::from_secs(4));
    }

    #[test]
    fn jitter_perturbs_output_but_not_the_stored_base() {
        let clock = FakeClock::new(Instant::now());
        let mut mgr = manager(&clock, Duration::MAX, 0.5);

        // Each delay lands in [base, base * 1.5) while the base itself keeps
        // the jitter-free 2, 4, 8 progression.
        for base_secs in [2u64, 4, 8] {
            let base = Duration::from_secs(base_secs);
            let delay = mgr.next_delay();
            assert!(delay >= base, "delay {delay:?} below base {base:?}");
            assert!(
                delay < base.mul_f64(1.5),
                "delay {delay:?} past jitter ceiling for base {base:?}"
            );
        }
    }

    #[test]
    fn rejects_non_growing_factor() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Instant::now()));
        for factor in [1.0, 0.5, 0.0, -2.0, f64::NAN] {
            let err = ExponentialBackoff::new(
                Duration::from_secs(2),
                Duration::from_secs(20),
                Duration::MAX,
                factor,
                0.0,
                clock.clone(),
            )
            .expect_err("factor must be rejected");
            assert!(matches!(err, ConfigError::Factor { .. }), "got {err:?}");
        }
    }

    #[test]
    fn rejects_max_below_initial() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Instant::now()));
        let err = ExponentialBackoff::new(
            Duration::from_secs(20),
            Duration::from_secs(2),
            Duration::MAX,
            2.0,
            0.0,
            clock,
        )
        .expect_err("cap below initial must be rejected");
        assert!(matches!(err, ConfigError::MaxBelowInitial { .. }));
    }

    #[test]
    fn rejects_negative_jitter() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Instant::now()));
        let err = ExponentialBackoff::new(
            Duration::from_secs(2),
            Duration::from_secs(20),
            Duration::MAX,
            2.0,
            -0.1,
            clock,
        )
        .expect_err("negative jitter must be rejected");
        assert!(matches!(err, ConfigError::Jitter { .. }));
    }

    #[test]
    fn rejects_zero_initial() {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Instant::now()));
        let err = ExponentialBackoff::new(
            Duration::ZERO,
            Duration::from_secs(20),
            Duration::MAX,
            2.0,
            0.0,
            clock,
        )
        .expect_err("zero initial must be rejected");
        assert!(matches!(err, ConfigError::ZeroInitial));
    }

    #[tokio::test]
    async fn backoff_returns_a_timer_for_the_computed_delay() {
        let clock = FakeClock::new(Instant::now());
        let mut mgr = manager(&clock, Duration::MAX, 0.0);

        let mut timer = mgr.backoff();
        assert!(clock.has_waiters());
        clock.advance(Duration::from_secs(2));
        timer.ready().await;
    }
}
