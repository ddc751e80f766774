// Server loop module
// Accepts connections on one listener until shutdown is requested

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;

use super::connection::accept_connection;
use super::ListenerRole;
use crate::config::AppState;
use crate::logger;

/// Per-listener loop settings
pub struct ServerLoopConfig {
    pub role: ListenerRole,
    pub tls: Option<TlsAcceptor>,
    pub shutdown: watch::Receiver<bool>,
}

/// Accept loop for one listener; returns once shutdown is signalled
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    mut config: ServerLoopConfig,
) {
    if *config.shutdown.borrow() {
        return;
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            config.role,
                            config.tls.as_ref(),
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = config.shutdown.changed() => break,
        }
    }
}
