// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub files: FilesConfig,
    pub stats: StatsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
///
/// Optional addresses are disabled when absent or empty.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub addr: String,
    #[serde(default)]
    pub tls_addr: Option<String>,
    #[serde(default)]
    pub stats_addr: Option<String>,
    /// Serve the dedicated stats listener over TLS
    #[serde(default)]
    pub stats_tls: bool,
    pub workers: Option<usize>,
}

/// Certificate and key used by every TLS listener
#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

/// File serving configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilesConfig {
    pub root: PathBuf,
    pub index_names: Vec<String>,
    pub generate_index_pages: bool,
    pub compress: bool,
    pub byte_range: bool,
    pub vhost: bool,
    /// List dotfiles in generated index pages
    pub show_hidden: bool,
    /// `Cache-Control` max-age for file responses, in seconds
    pub cache_max_age: u32,
    /// Smallest body worth compressing, in bytes
    pub compress_min_size: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatsConfig {
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, console if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Zero disables keep-alive
    pub keep_alive_timeout: u64,
    /// Seconds allowed for a request head to arrive; zero disables the limit
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Immutable file-serving settings handed to the file handler
#[derive(Debug, Clone)]
pub struct FileServerConfig {
    pub root: PathBuf,
    pub index_names: Vec<String>,
    pub generate_index_pages: bool,
    pub compress: bool,
    pub accept_byte_range: bool,
    pub vhost: bool,
    pub show_hidden: bool,
    pub cache_max_age: u32,
    pub compress_min_size: u64,
}

impl FileServerConfig {
    /// Defaults for serving `root`: `index.html`, listings on, everything else off
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_names: vec!["index.html".to_string()],
            generate_index_pages: true,
            compress: false,
            accept_byte_range: false,
            vhost: false,
            show_hidden: false,
            cache_max_age: 86_400,
            compress_min_size: 256,
        }
    }
}

impl From<&FilesConfig> for FileServerConfig {
    fn from(files: &FilesConfig) -> Self {
        Self {
            root: files.root.clone(),
            index_names: files.index_names.clone(),
            generate_index_pages: files.generate_index_pages,
            compress: files.compress,
            accept_byte_range: files.byte_range,
            vhost: files.vhost,
            show_hidden: files.show_hidden,
            cache_max_age: files.cache_max_age,
            compress_min_size: files.compress_min_size,
        }
    }
}
