//! # Wall-clock [`Clock`] implementation.
//!
//! [`RealClock`] reads [`std::time::Instant`] and schedules timers on the
//! tokio runtime: each timer is a spawned task that sleeps for the requested
//! duration and then fires a oneshot channel. Stopping the timer aborts the
//! task, which is what releases the scheduling resource.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::clock::{Clock, Timer};

/// Production clock backed by the system's monotonic clock and tokio timers.
///
/// [`Clock::timer`] must be called from within a tokio runtime.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use waitloop::{Clock, RealClock};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let clock = RealClock;
/// let mut timer = clock.timer(Duration::from_millis(5));
/// timer.ready().await;
/// assert!(!timer.stop()); // already fired
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn timer(&self, duration: Duration) -> Timer {
        let (tx, rx) = oneshot::channel();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            flag.store(true, Ordering::Release);
            let _ = tx.send(());
        });

        Timer::new(
            rx,
            Box::new(move || {
                let was_pending = !fired.load(Ordering::Acquire);
                handle.abort();
                was_pending
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_at_or_after_duration() {
        let clock = RealClock;
        let started = tokio::time::Instant::now();
        let mut timer = clock.timer(Duration::from_millis(100));
        timer.ready().await;
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_on_pending_timer_returns_true() {
        let clock = RealClock;
        let mut timer = clock.timer(Duration::from_secs(3600));
        assert!(timer.stop());
        assert!(!timer.stop(), "second stop must report not-pending");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_after_fire_returns_false() {
        let clock = RealClock;
        let mut timer = clock.timer(Duration::from_millis(1));
        timer.ready().await;
        assert!(!timer.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_timer_is_immediately_ready() {
        let clock = RealClock;
        let mut timer = clock.timer(Duration::ZERO);
        timer.ready().await;
    }
}
