//! Logger module
//!
//! Thin helpers over `tracing`:
//! - Server lifecycle logging
//! - Access logging with multiple formats, under the `access` target
//! - Error and warning logging
//!
//! When `access_log_file` is set, access lines go only to that file.

mod format;

pub use format::AccessLogEntry;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::{EnvFilter, LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt;

use crate::config::{Config, LoggingConfig};
use crate::error::StartupError;
use crate::server::ListenerSpec;

/// Target used for access log lines
pub const ACCESS_TARGET: &str = "access";

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. Should be called once at
/// application startup.
pub fn init(config: &LoggingConfig) -> Result<(), StartupError> {
    let mut filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| StartupError::Logging(format!("invalid log level: {e}")))?;

    let access_layer = match config.access_log_file.as_deref() {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StartupError::Logging(format!("cannot create {}: {e}", parent.display())))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| StartupError::Logging(format!("cannot open {path}: {e}")))?;
            filter = filter.add_directive(
                format!("{ACCESS_TARGET}=off")
                    .parse()
                    .map_err(|e| StartupError::Logging(format!("{e}")))?,
            );
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .without_time()
                    .with_level(false)
                    .with_target(false)
                    .with_filter(Targets::new().with_target(ACCESS_TARGET, LevelFilter::INFO)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .with(access_layer)
        .try_init()
        .map_err(|e| StartupError::Logging(e.to_string()))
}

pub fn log_server_start(config: &Config, listeners: &[ListenerSpec]) {
    tracing::info!("static file server started");
    tracing::info!("Serving: {}", config.files.root.display());
    for spec in listeners {
        log_listener(spec);
    }
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!(
        compress = config.files.compress,
        byte_range = config.files.byte_range,
        vhost = config.files.vhost,
        index_pages = config.files.generate_index_pages,
        stats = config.stats.enabled,
        "File serving options"
    );
    if let Some(ref path) = config.logging.access_log_file {
        tracing::info!("Access log: {path}");
    }
}

pub fn log_listener(spec: &ListenerSpec) {
    let scheme = if spec.tls { "https" } else { "http" };
    tracing::info!("Listening on: {scheme}://{} ({})", spec.addr, spec.role);
}

pub fn log_shutdown() {
    tracing::info!("Shutdown signal received, stopping listeners");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    tracing::debug!("Failed to serve connection: {err}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
