//! # The periodic runner loop.
//!
//! [`backoff_until`] repeatedly invokes a task, obtains the next delay timer
//! from a [`BackoffManager`], and races that timer against a
//! [`CancellationToken`]. The wrappers ([`jitter_until`], [`until`],
//! [`forever`]) only pick the manager and the token.
//!
//! ## Loop shape (per iteration)
//! ```text
//! ├─► token cancelled? ── yes ──► return (task does not run)
//! ├─► if !sliding: timer = manager.backoff()     (delay window includes
//! │                                               task execution time)
//! ├─► task().await                               (never preempted)
//! ├─► if sliding:  timer = manager.backoff()     (delay is pure dead time
//! │                                               after the task finishes)
//! └─► select! { biased;
//!        token.cancelled() ─► stop timer, return
//!        timer.ready()     ─► stop timer, next iteration
//!     }
//! ```
//!
//! ## Rules
//! - Cancellation is observed at **loop boundaries** only; a running task
//!   always completes. Cancelling mid-wait aborts the wait promptly.
//! - Cancellation **wins ties**: if the token fires in the same instant the
//!   timer does, the loop terminates without another task execution.
//! - Every timer is stopped once the race is decided, so a superseded timer
//!   releases its scheduling resource instead of leaking it.
//! - The task is opaque: no arguments, no result. Whatever failure handling
//!   it wants lives inside the task; the runner never retries on its own, it
//!   only re-invokes on schedule.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::backoff::{BackoffManager, JitteredBackoff};
use crate::clock::RealClock;

/// Runs `task` with a delay between iterations computed by `manager`, until
/// `token` is cancelled.
///
/// With `sliding == false` the timer is obtained **before** the task runs, so
/// the task's own execution time eats into the wait and iteration starts keep
/// a fixed cadence (a task outlasting the whole period is re-run immediately,
/// never with a negative wait). With `sliding == true` the timer is obtained after
/// the task completes, so the delay is a fixed gap between task end and the
/// next start.
///
/// An already-cancelled token means zero task executions.
pub async fn backoff_until<F, Fut, B>(
    mut task: F,
    manager: &mut B,
    sliding: bool,
    token: CancellationToken,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    B: BackoffManager + ?Sized,
{
    loop {
        if token.is_cancelled() {
            return;
        }

        let early = if sliding { None } else { Some(manager.backoff()) };

        task().await;

        let mut timer = match early {
            Some(timer) => timer,
            None => manager.backoff(),
        };

        let fired = tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = timer.ready() => true,
        };
        timer.stop();

        if !fired {
            trace!("cancellation observed mid-wait; loop stops");
            return;
        }
    }
}

/// Runs `task` every `period`, with each period optionally stretched into
/// `[period, period * (1 + jitter_factor))`, until `token` is cancelled.
///
/// `jitter_factor <= 0.0` disables randomization. See [`backoff_until`] for
/// the `sliding` semantics; this is the same loop driven by a
/// [`JitteredBackoff`] over the real clock.
pub async fn jitter_until<F, Fut>(
    task: F,
    period: Duration,
    jitter_factor: f64,
    sliding: bool,
    token: CancellationToken,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut manager = JitteredBackoff::new(period, jitter_factor, Arc::new(RealClock));
    backoff_until(task, &mut manager, sliding, token).await
}

/// Runs `task` every `period` until `token` is cancelled.
///
/// Sliding periods, no jitter: the delay is measured from the end of one task
/// execution to the start of the next.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use waitloop::{until, CancellationToken};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let token = CancellationToken::new();
///
///     let stop = token.clone();
///     tokio::spawn(async move {
///         tokio::time::sleep(Duration::from_secs(60)).await;
///         stop.cancel();
///     });
///
///     until(|| async { println!("doing task...") }, Duration::from_secs(10), token).await;
/// }
/// ```
pub async fn until<F, Fut>(task: F, period: Duration, token: CancellationToken)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    jitter_until(task, period, 0.0, true, token).await
}

/// Runs `task` every `period`, forever.
///
/// [`until`] with a token nobody can cancel.
pub async fn forever<F, Fut>(task: F, period: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    until(task, period, CancellationToken::new()).await
}
