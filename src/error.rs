//! Error types used by backoff construction.
//!
//! The runtime surface of this crate is infallible: loops return by handing
//! control back to the caller, timers always resolve, and task outcomes are
//! invisible to the core. The only thing that can go wrong is a bad policy
//! configuration, and that fails fast at construction via [`ConfigError`]
//! rather than surfacing mid-loop.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced when constructing a backoff policy.
///
/// Returned by [`ExponentialBackoff::new`](crate::ExponentialBackoff::new).
/// A policy that validates is guaranteed never to fail afterwards.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Growth factor must be finite and greater than 1.0; anything else makes
    /// the delay sequence non-increasing.
    #[error("growth factor must be > 1.0, got {factor}")]
    Factor {
        /// The rejected factor.
        factor: f64,
    },

    /// The delay cap is below the starting delay.
    #[error("max duration {max:?} is below initial duration {initial:?}")]
    MaxBelowInitial {
        /// The configured initial delay.
        initial: Duration,
        /// The configured cap.
        max: Duration,
    },

    /// Jitter fraction must be finite and non-negative.
    #[error("jitter must be >= 0.0, got {jitter}")]
    Jitter {
        /// The rejected jitter fraction.
        jitter: f64,
    },

    /// The initial delay is zero. Zero is a fixpoint of the growth step, so
    /// every subsequent delay would also be zero and the loop would spin hot.
    #[error("initial duration must be non-zero")]
    ZeroInitial,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use waitloop::ConfigError;
    ///
    /// let err = ConfigError::Factor { factor: 0.5 };
    /// assert_eq!(err.as_label(), "config_factor");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Factor { .. } => "config_factor",
            ConfigError::MaxBelowInitial { .. } => "config_max_below_initial",
            ConfigError::Jitter { .. } => "config_jitter",
            ConfigError::ZeroInitial => "config_zero_initial",
        }
    }
}
