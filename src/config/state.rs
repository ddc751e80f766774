// Application state module
// Shared by every listener for the lifetime of the process

use std::sync::Arc;

use super::types::{Config, FileServerConfig};
use crate::handler::static_files::FileHandler;
use crate::stats::StatsRegistry;

/// Application state
pub struct AppState {
    pub config: Config,
    pub files: FileHandler,
    pub stats: Arc<StatsRegistry>,

    // Resolved once at startup
    pub stats_route: bool,
    pub access_log: bool,
}

impl AppState {
    /// Build the state; fails when the served root cannot be opened
    pub fn new(config: Config) -> std::io::Result<Self> {
        let stats = Arc::new(StatsRegistry::new());
        let files = FileHandler::new(FileServerConfig::from(&config.files), Arc::clone(&stats))?;

        Ok(Self {
            stats_route: config.stats_route_enabled(),
            access_log: config.logging.access_log,
            config,
            files,
            stats,
        })
    }
}
