//! # Independent jittered delays around a base period.
//!
//! [`JitteredBackoff`] has no notion of growth or reset: every call computes
//! `base + random(0, base * jitter_factor)` and hands back a fresh timer, so
//! successive delays are independent and identically distributed. With
//! `jitter_factor <= 0.0` it degenerates into a fixed-period source, which is
//! exactly what [`until`](crate::until) runs on.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::trace;

use crate::backoff::{BackoffManager, jitter};
use crate::clock::{Clock, Timer};

/// Backoff manager producing iid delays in `[base, base * (1 + jitter_factor))`.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use waitloop::{backoff_until, CancellationToken, JitteredBackoff, RealClock};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     // Resync every 10..15s so replicas don't hit the server in lockstep.
///     let mut manager =
///         JitteredBackoff::new(Duration::from_secs(10), 0.5, Arc::new(RealClock));
///     let token = CancellationToken::new();
///     backoff_until(|| async { /* resync */ }, &mut manager, true, token).await;
/// }
/// ```
pub struct JitteredBackoff {
    base: Duration,
    jitter_factor: f64,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl JitteredBackoff {
    /// Creates a manager with an OS-seeded random source.
    ///
    /// `jitter_factor <= 0.0` disables randomization; the manager then
    /// returns `base` on every call.
    pub fn new(base: Duration, jitter_factor: f64, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(base, jitter_factor, clock, StdRng::from_os_rng())
    }

    /// Creates a manager with an explicit random source for reproducible
    /// delay sequences.
    pub fn with_rng(base: Duration, jitter_factor: f64, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            base,
            jitter_factor,
            clock,
            rng,
        }
    }

    fn next_delay(&mut self) -> Duration {
        if self.jitter_factor > 0.0 {
            jitter(self.base, self.jitter_factor, &mut self.rng)
        } else {
            self.base
        }
    }
}

impl BackoffManager for JitteredBackoff {
    fn backoff(&mut self) -> Timer {
        let delay = self.next_delay();
        trace!(?delay, "scheduling jittered backoff");
        self.clock.timer(delay)
    }
}

impl std::fmt::Debug for JitteredBackoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitteredBackoff")
            .field("base", &self.base)
            .field("jitter_factor", &self.jitter_factor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use std::time::Instant;

    fn manager(jitter_factor: f64) -> JitteredBackoff {
        JitteredBackoff::with_rng(
            Duration::from_secs(2),
            jitter_factor,
            Arc::new(FakeClock::new(Instant::now())),
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn delays_stay_in_the_jitter_interval() {
        let mut mgr = manager(2.0);
        for _ in 0..1000 {
            let d = mgr.next_delay();
            assert!(d >= Duration::from_secs(2), "delay {d:?} below base");
            assert!(d < Duration::from_secs(6), "delay {d:?} past base * 3");
        }
    }

    #[test]
    fn delays_spread_across_the_interval() {
        let mut mgr = manager(2.0);
        let mut lo = Duration::MAX;
        let mut hi = Duration::ZERO;
        for _ in 0..1000 {
            let d = mgr.next_delay();
            lo = lo.min(d);
            hi = hi.max(d);
        }
        // A uniform draw over [2s, 6s) should reach both ends of the range.
        assert!(lo < Duration::from_secs(3), "min {lo:?} never near base");
        assert!(hi > Duration::from_secs(5), "max {hi:?} never near ceiling");
    }

    #[test]
    fn zero_factor_means_fixed_period() {
        let mut mgr = manager(0.0);
        for _ in 0..10 {
            assert_eq!(mgr.next_delay(), Duration::from_secs(2));
        }
    }

    #[test]
    fn negative_factor_means_fixed_period() {
        let mut mgr = manager(-1.5);
        assert_eq!(mgr.next_delay(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn backoff_returns_a_timer_for_the_computed_delay() {
        let clock = FakeClock::new(Instant::now());
        let mut mgr = JitteredBackoff::with_rng(
            Duration::from_secs(2),
            0.0,
            Arc::new(clock.clone()),
            StdRng::seed_from_u64(42),
        );

        let mut timer = mgr.backoff();
        assert!(clock.has_waiters());
        clock.advance(Duration::from_secs(2));
        timer.ready().await;
    }
}
