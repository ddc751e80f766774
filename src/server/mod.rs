// Server module entry
// Binds the configured listeners and runs them until shutdown

pub mod connection;
pub mod listener;
pub mod signal;
pub mod tls;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::{AppState, Config};
use crate::error::StartupError;
use crate::logger;

pub use listener::create_reusable_listener;
pub use server_loop::{start_server_loop, ServerLoopConfig};
pub use signal::SignalHandler;

/// What a listener serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerRole {
    /// Files, plus `/stats` when no dedicated stats listener exists
    Files,
    /// Only the stats endpoint, at any path
    StatsOnly,
}

impl fmt::Display for ListenerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files => f.write_str("files"),
            Self::StatsOnly => f.write_str("stats"),
        }
    }
}

/// One address to listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSpec {
    pub addr: SocketAddr,
    pub tls: bool,
    pub role: ListenerRole,
}

/// Run the server until SIGINT/SIGTERM
///
/// Every listener is bound before any of them accepts; a bind, TLS or root
/// directory failure aborts startup.
pub async fn run(config: Config) -> Result<(), StartupError> {
    let specs = config.listener_specs()?;
    if specs.is_empty() {
        logger::log_warning("No listen address configured; nothing to serve");
        return Ok(());
    }

    let acceptor = if specs.iter().any(|s| s.tls) {
        Some(tls::load_tls_acceptor(
            &config.tls.cert_file,
            &config.tls.key_file,
        )?)
    } else {
        None
    };

    let mut listeners = Vec::with_capacity(specs.len());
    for spec in &specs {
        let listener = create_reusable_listener(spec.addr).map_err(|source| {
            StartupError::Bind {
                addr: spec.addr,
                source,
            }
        })?;
        listeners.push((*spec, listener));
    }

    logger::log_server_start(&config, &specs);
    let root = config.files.root.clone();
    let state = Arc::new(AppState::new(config).map_err(|e| {
        logger::log_error(&format!("Cannot open root directory {}: {e}", root.display()));
        e
    })?);
    let active_connections = Arc::new(AtomicUsize::new(0));
    let signals = SignalHandler::new();

    let mut loops = JoinSet::new();
    for (spec, listener) in listeners {
        let loop_config = ServerLoopConfig {
            role: spec.role,
            tls: if spec.tls { acceptor.clone() } else { None },
            shutdown: signals.subscribe(),
        };
        loops.spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&active_connections),
            loop_config,
        ));
    }

    signal::wait_for_shutdown(&signals).await?;
    while loops.join_next().await.is_some() {}
    Ok(())
}
