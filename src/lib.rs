//! # waitloop
//!
//! **Waitloop** is a small library for running a task repeatedly: fixed,
//! jittered, or exponentially backed-off delays between iterations, with
//! cooperative cancellation and a choice between sliding and fixed period
//! semantics. It is the retry/poll/resync building block, kept deliberately
//! free of any knowledge about what the task does.
//!
//! ## Architecture
//! ```text
//!               ┌─────────────────────────────────────────────┐
//!               │ Runner loop                                 │
//!  task ───────►│  forever / until / jitter_until /           │
//!  token ──────►│  backoff_until                              │
//!               │                                             │
//!               │  per iteration:                             │
//!               │   1. token cancelled? ─► stop               │
//!               │   2. timer = policy.backoff()  (order per   │
//!               │      the sliding flag)                      │
//!               │   3. task().await                           │
//!               │   4. race: timer ready | token cancelled    │
//!               └───────┬─────────────────────────────────────┘
//!                       ▼
//!          ┌──────────────────────────┐
//!          │ BackoffManager           │
//!          │  ExponentialBackoff      │   delays: initial × factor^n, capped,
//!          │  JitteredBackoff         │   or iid base + random(0, base·jf)
//!          └───────┬──────────────────┘
//!                  ▼
//!          ┌──────────────────────────┐
//!          │ Clock                    │
//!          │  RealClock (tokio)       │   now() + one-shot Timer
//!          │  FakeClock (tests)       │
//!          └──────────────────────────┘
//! ```
//!
//! ## Features
//! | Area             | Description                                              | Key types / functions                        |
//! |------------------|----------------------------------------------------------|----------------------------------------------|
//! | **Loops**        | Periodic execution with cancellation and sliding control.| [`forever`], [`until`], [`jitter_until`], [`backoff_until`] |
//! | **Policies**     | Delay strategies between iterations.                     | [`BackoffManager`], [`ExponentialBackoff`], [`JitteredBackoff`] |
//! | **Time**         | Injectable clock and one-shot timers.                    | [`Clock`], [`RealClock`], [`FakeClock`], [`Timer`] |
//! | **Cancellation** | One-shot, fan-out stop signal.                           | [`CancellationToken`]                        |
//! | **Errors**       | Fail-fast policy construction errors.                    | [`ConfigError`]                              |
//!
//! ## Optional features
//! - `signals`: OS termination signals wired into a [`CancellationToken`]
//!   (see [`signal`]).
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use waitloop::{backoff_until, CancellationToken, ExponentialBackoff, RealClock};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), waitloop::ConfigError> {
//!     // Delays of 2s, 4s, 8s, ... capped at 20s; the sequence restarts from
//!     // 2s after a quiet minute.
//!     let mut manager = ExponentialBackoff::new(
//!         Duration::from_secs(2),
//!         Duration::from_secs(20),
//!         Duration::from_secs(60),
//!         2.0,
//!         0.0,
//!         Arc::new(RealClock),
//!     )?;
//!
//!     let token = CancellationToken::new();
//!     let stop = token.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_secs(300)).await;
//!         stop.cancel();
//!     });
//!
//!     backoff_until(
//!         || async { println!("polling...") },
//!         &mut manager,
//!         true, // sliding: the delay starts when the task finishes
//!         token,
//!     )
//!     .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency contract
//! - One runner invocation is one future: task execution, delay computation,
//!   and the wait are strictly sequential inside it.
//! - A [`BackoffManager`] is single-owner (`&mut self`); share a
//!   [`CancellationToken`] instead when several loops must stop together.
//! - A running task is never preempted. Cancellation is observed at loop
//!   boundaries and wins ties against a firing timer.

mod backoff;
mod clock;
mod error;
mod wait;

// ---- Public re-exports ----

pub use backoff::{BackoffManager, ExponentialBackoff, JitteredBackoff};
pub use clock::{Clock, FakeClock, RealClock, Timer};
pub use error::ConfigError;
pub use wait::{backoff_until, forever, jitter_until, until};

/// One-shot, broadcastable stop signal; cloning fans the signal out to every
/// loop holding a clone.
pub use tokio_util::sync::CancellationToken;

// Optional: wire OS termination signals into a CancellationToken.
// Enable with: `--features signals`
#[cfg(feature = "signals")]
pub mod signal;
