//! # Cross-platform OS signal handling.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when
//! the process receives a termination signal, and [`shutdown_token`], which
//! packages it as a [`CancellationToken`] ready to hand to [`until`](crate::until)
//! or [`backoff_until`](crate::backoff_until).
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal
/// registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal
/// registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Returns a token that is cancelled when the process receives a termination
/// signal.
///
/// Spawns a background listener; clones of the returned token fan out to any
/// number of loops that should all stop together on shutdown.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use waitloop::{signal::shutdown_token, until};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let token = shutdown_token();
///     until(|| async { /* poll */ }, Duration::from_secs(10), token).await;
/// }
/// ```
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();

    let cancel = token.clone();
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(()) => cancel.cancel(),
            Err(error) => warn!(%error, "signal registration failed; shutdown token stays live"),
        }
    });

    token
}
