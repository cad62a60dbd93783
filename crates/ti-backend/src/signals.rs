//! SIGINT/SIGTERM handling (spec.md §4.5: "On receipt of SIGINT/SIGTERM:
//! set the shutdown flag"). Grounded on the original's
//! `signal.signal(signal.SIGTERM, kill_handler)`, translated to
//! `tokio::signal`.

use ti_core::Shutdown;

/// Wait for either signal, then call [`Shutdown::signal`]. Runs until the
/// first signal arrives; intended to be spawned once at startup.
pub async fn install(shutdown: Shutdown) {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c");
        }
    }

    shutdown.signal();
}
