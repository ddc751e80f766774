//! Command-line interface
//!
//! Flags mirror the configuration keys they override; anything left unset
//! falls through to the config file, the environment, or the defaults.

use clap::Parser;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

#[derive(Debug, Parser)]
#[command(name = "staticd", version, about = "Serves static files and exposes request counters")]
pub struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// TCP address to listen to
    #[arg(long)]
    pub addr: Option<String>,

    /// TCP address to listen to TLS requests; empty disables TLS
    #[arg(long)]
    pub addr_tls: Option<String>,

    /// TCP address of the dedicated stats listener
    #[arg(long)]
    pub addr_stats: Option<String>,

    /// Serve the dedicated stats listener over TLS
    #[arg(long)]
    pub stats_tls: Option<bool>,

    /// Path to TLS certificate file
    #[arg(long)]
    pub cert_file: Option<String>,

    /// Path to TLS key file
    #[arg(long)]
    pub key_file: Option<String>,

    /// Directory to serve static files from
    #[arg(long)]
    pub dir: Option<String>,

    /// Enable byte range requests
    #[arg(long)]
    pub byte_range: Option<bool>,

    /// Enable transparent response compression
    #[arg(long)]
    pub compress: Option<bool>,

    /// Generate directory index pages
    #[arg(long)]
    pub generate_index_pages: Option<bool>,

    /// Prefix request paths with the requested host name
    #[arg(long)]
    pub vhost: Option<bool>,

    /// Enable stats serving
    #[arg(long)]
    pub stats: Option<bool>,
}

impl Cli {
    pub(crate) fn apply_overrides(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_override_option("server.addr", self.addr.clone())?
            .set_override_option("server.tls_addr", self.addr_tls.clone())?
            .set_override_option("server.stats_addr", self.addr_stats.clone())?
            .set_override_option("server.stats_tls", self.stats_tls)?
            .set_override_option("tls.cert_file", self.cert_file.clone())?
            .set_override_option("tls.key_file", self.key_file.clone())?
            .set_override_option("files.root", self.dir.clone())?
            .set_override_option("files.byte_range", self.byte_range)?
            .set_override_option("files.compress", self.compress)?
            .set_override_option("files.generate_index_pages", self.generate_index_pages)?
            .set_override_option("files.vhost", self.vhost)?
            .set_override_option("stats.enabled", self.stats)
    }
}
