//! SIGINT/SIGTERM to [`RunFlag`] adapter.

use tonelink_core::{Result, RunFlag, ToneLinkError};
use tracing::{info, warn};

/// Spawns a thread that clears the returned flag on the first shutdown
/// signal. The drivers see it at the top of their next iteration.
pub fn install() -> Result<RunFlag> {
    let flag = RunFlag::new();
    let handle = flag.clone();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| ToneLinkError::setup(format!("cannot start signal runtime: {err}")))?;

    std::thread::Builder::new()
        .name("tonelink-signals".into())
        .spawn(move || runtime.block_on(wait_for_shutdown(handle)))?;

    Ok(flag)
}

#[cfg(unix)]
async fn wait_for_shutdown(flag: RunFlag) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            (Err(err), _) | (_, Err(err)) => {
                warn!(%err, "cannot install signal handlers; stop with SIGKILL");
                return;
            }
        };

    tokio::select! {
        _ = interrupt.recv() => info!("SIGINT received, shutting down"),
        _ = terminate.recv() => info!("SIGTERM received, shutting down"),
    }
    flag.stop();
}

#[cfg(not(unix))]
async fn wait_for_shutdown(flag: RunFlag) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl-C received, shutting down");
            flag.stop();
        }
        Err(err) => warn!(%err, "cannot install Ctrl-C handler"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_flag_starts_running() {
        let flag = install().unwrap();
        assert!(flag.is_running());
    }
}
