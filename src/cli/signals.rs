//! Shutdown signal handling

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Start listening for SIGINT / SIGTERM.
///
/// The returned token is cancelled on the first signal.
pub fn shutdown_token() -> Result<CancellationToken, std::io::Error> {
    let token = CancellationToken::new();
    spawn_listener(token.clone())?;
    Ok(token)
}

#[cfg(unix)]
fn spawn_listener(token: CancellationToken) -> Result<(), std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT (shutdown)"),
            _ = sigterm.recv() => info!("Received SIGTERM (shutdown)"),
        }
        token.cancel();
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_listener(token: CancellationToken) -> Result<(), std::io::Error> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C (shutdown)");
            token.cancel();
        }
    });
    Ok(())
}
