// Signal handling module
//
// Supported signals:
// - SIGTERM: Shutdown
// - SIGINT:  Shutdown (Ctrl+C)

use tokio::sync::watch;

use crate::logger;

/// Shutdown broadcast shared by every accept loop
pub struct SignalHandler {
    shutdown: watch::Sender<bool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { shutdown }
    }

    /// Receiver that observes the shutdown request
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Request shutdown of every subscribed loop
    pub fn trigger(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGINT or SIGTERM, then trigger shutdown (Unix)
#[cfg(unix)]
pub async fn wait_for_shutdown(handler: &SignalHandler) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }

    logger::log_shutdown();
    handler.trigger();
    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_shutdown(handler: &SignalHandler) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    logger::log_shutdown();
    handler.trigger();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_subscribers() {
        let handler = SignalHandler::new();
        let mut rx = handler.subscribe();
        assert!(!*rx.borrow());

        handler.trigger();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());

        // Late subscribers see the request immediately
        assert!(*handler.subscribe().borrow());
    }
}
