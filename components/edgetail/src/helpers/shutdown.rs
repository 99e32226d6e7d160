// External crates
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Process-wide shutdown handle, built on-top of a `CancellationToken`
///
/// - The runtime owns the root token.
/// - Each long-running piece receives a `child()` token and checks it at its
/// own suspension points.
/// - Calling `.trigger()` (or an operator interrupt) cancels every child.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    #[instrument(
        name = "edgetail_shutdown_channel",
        target = "helpers::shutdown",
        level = "trace"
    )]
    pub fn new() -> Self {
        tracing::trace!("Creating new shutdown token");
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token for one component; cancelled together with the root.
    pub fn child(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Cancel the root token, notifying every child.
    #[instrument(
        name = "edgetail_shutdown_trigger",
        target = "helpers::shutdown",
        level = "trace"
    )]
    pub fn trigger(&self) {
        tracing::trace!("Shutdown triggered, cancelling all child tokens");
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn the signal listener: Ctrl+C (and SIGTERM on Unix) trigger
    /// shutdown once. Must be called from inside a tokio runtime.
    pub fn listen_for_signals(&self) {
        let shutdown = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.token.cancelled() => {}
                signal = wait_for_signal() => {
                    match signal {
                        Ok(name) => tracing::info!(signal = name, "Signal received, shutting down"),
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to listen for shutdown signals");
                            return;
                        }
                    }
                    shutdown.trigger();
                }
            }
        });
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_cancels_children() {
        let shutdown = Shutdown::new();
        let child = shutdown.child();

        shutdown.trigger();

        assert!(child.is_cancelled());
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn cancelling_a_child_leaves_the_root_alone() {
        let shutdown = Shutdown::new();
        let child = shutdown.child();

        child.cancel();

        assert!(!shutdown.is_triggered());
    }
}
