//! Periodic execution loops with cooperative cancellation.
//!
//! Four entry points, increasing in generality:
//!
//! | Function | Period source | Stops on |
//! |---|---|---|
//! | [`forever`] | fixed | never |
//! | [`until`] | fixed, sliding | token |
//! | [`jitter_until`] | fixed + jitter fraction | token |
//! | [`backoff_until`] | any [`BackoffManager`](crate::BackoffManager) | token |
//!
//! Each wrapper is sugar over the next: `forever` is `until` with a token
//! nobody can cancel, `until` is `jitter_until` with no jitter and sliding
//! periods, and `jitter_until` is `backoff_until` driven by a
//! [`JitteredBackoff`](crate::JitteredBackoff) over the real clock.

mod runner;

pub use runner::{backoff_until, forever, jitter_until, until};
