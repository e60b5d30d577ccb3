//! # Manually driven [`Clock`] for deterministic tests.
//!
//! [`FakeClock`] keeps simulated time frozen until the test advances it.
//! Timers created from it are queued as waiters and fire when an
//! [`advance`](FakeClock::advance) moves simulated time past their deadline,
//! so timing-sensitive loop behavior can be asserted without real sleeps.
//!
//! ## Example
//! ```
//! use std::time::{Duration, Instant};
//! use waitloop::{Clock, FakeClock};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let clock = FakeClock::new(Instant::now());
//! let mut timer = clock.timer(Duration::from_secs(5));
//!
//! assert!(clock.has_waiters());
//! clock.advance(Duration::from_secs(5));
//! timer.ready().await; // resolves immediately, no real time passed
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::clock::{Clock, Timer};

// Deadline clamp for durations too large to represent as an Instant offset.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Simulated clock; cheap to clone, all clones share the same time.
#[derive(Clone, Debug)]
pub struct FakeClock {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    now: Instant,
    next_id: u64,
    waiters: Vec<Waiter>,
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    deadline: Instant,
    tx: oneshot::Sender<()>,
}

impl FakeClock {
    /// Creates a fake clock whose simulated "now" starts at `origin`.
    pub fn new(origin: Instant) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                now: origin,
                next_id: 0,
                waiters: Vec::new(),
            })),
        }
    }

    /// Moves simulated time forward and fires every timer whose deadline has
    /// been reached.
    pub fn advance(&self, d: Duration) {
        let mut inner = self.lock();
        inner.now += d;
        fire_due(&mut inner);
    }

    /// Jumps simulated time to the earliest pending deadline and fires it
    /// (plus anything else that became due). Returns the duration advanced,
    /// or `None` when no timer is pending.
    ///
    /// This is the manual equivalent of tokio's auto-advancing paused clock.
    pub fn advance_to_next_timer(&self) -> Option<Duration> {
        let mut inner = self.lock();
        let next = inner.waiters.iter().map(|w| w.deadline).min()?;
        let step = next.duration_since(inner.now);
        inner.now = next;
        fire_due(&mut inner);
        Some(step)
    }

    /// Reports whether any timer is still waiting to fire.
    pub fn has_waiters(&self) -> bool {
        !self.lock().waiters.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.lock().now
    }

    fn timer(&self, duration: Duration) -> Timer {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.lock();

        if duration.is_zero() {
            let _ = tx.send(());
            return Timer::new(rx, Box::new(|| false));
        }

        let deadline = inner
            .now
            .checked_add(duration)
            .unwrap_or_else(|| inner.now + FAR_FUTURE);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.waiters.push(Waiter { id, deadline, tx });

        let weak = Arc::downgrade(&self.inner);
        Timer::new(rx, Box::new(move || remove_waiter(&weak, id)))
    }
}

/// Fires and removes every waiter whose deadline is at or before `now`.
fn fire_due(inner: &mut Inner) {
    let now = inner.now;
    let mut i = 0;
    while i < inner.waiters.len() {
        if inner.waiters[i].deadline <= now {
            let waiter = inner.waiters.swap_remove(i);
            let _ = waiter.tx.send(());
        } else {
            i += 1;
        }
    }
}

/// Stop path for fake timers: true iff the waiter was still queued.
fn remove_waiter(clock: &Weak<Mutex<Inner>>, id: u64) -> bool {
    let Some(inner) = clock.upgrade() else {
        return false;
    };
    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
    match inner.waiters.iter().position(|w| w.id == id) {
        Some(pos) => {
            inner.waiters.swap_remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timer_does_not_fire_before_deadline() {
        let clock = FakeClock::new(Instant::now());
        let mut timer = clock.timer(Duration::from_secs(5));

        clock.advance(Duration::from_secs(4));
        let waited = tokio::time::timeout(Duration::from_millis(10), timer.ready()).await;
        assert!(waited.is_err(), "timer fired one second early");

        clock.advance(Duration::from_secs(1));
        timer.ready().await;
    }

    #[tokio::test]
    async fn advance_fires_every_due_timer() {
        let clock = FakeClock::new(Instant::now());
        let mut short = clock.timer(Duration::from_secs(1));
        let mut long = clock.timer(Duration::from_secs(10));

        clock.advance(Duration::from_secs(10));
        short.ready().await;
        long.ready().await;
        assert!(!clock.has_waiters());
    }

    #[test]
    fn now_tracks_advances() {
        let origin = Instant::now();
        let clock = FakeClock::new(origin);
        clock.advance(Duration::from_secs(3));
        clock.advance(Duration::from_secs(4));
        assert_eq!(clock.now().duration_since(origin), Duration::from_secs(7));
    }

    #[test]
    fn stop_on_pending_timer_removes_waiter() {
        let clock = FakeClock::new(Instant::now());
        let mut timer = clock.timer(Duration::from_secs(5));

        assert!(clock.has_waiters());
        assert!(timer.stop());
        assert!(!clock.has_waiters());
        assert!(!timer.stop(), "second stop must report not-pending");
    }

    #[test]
    fn stop_after_fire_returns_false() {
        let clock = FakeClock::new(Instant::now());
        let mut timer = clock.timer(Duration::from_secs(5));
        clock.advance(Duration::from_secs(5));
        assert!(!timer.stop());
    }

    #[test]
    fn dropping_a_timer_releases_its_slot() {
        let clock = FakeClock::new(Instant::now());
        let timer = clock.timer(Duration::from_secs(5));
        drop(timer);
        assert!(!clock.has_waiters());
    }

    #[tokio::test]
    async fn zero_duration_timer_is_immediately_ready() {
        let clock = FakeClock::new(Instant::now());
        let mut timer = clock.timer(Duration::ZERO);
        timer.ready().await;
        assert!(!clock.has_waiters());
    }

    #[test]
    fn advance_to_next_timer_steps_to_earliest_deadline() {
        let clock = FakeClock::new(Instant::now());
        let _t1 = clock.timer(Duration::from_secs(2));
        let _t2 = clock.timer(Duration::from_secs(7));

        assert_eq!(clock.advance_to_next_timer(), Some(Duration::from_secs(2)));
        assert_eq!(clock.advance_to_next_timer(), Some(Duration::from_secs(5)));
        assert_eq!(clock.advance_to_next_timer(), None);
    }
}
