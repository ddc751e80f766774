// Configuration module entry point
// Loads layered configuration and derives the listener plan

mod state;
mod types;

use std::net::SocketAddr;

use crate::cli::Cli;
use crate::error::StartupError;
use crate::server::{ListenerRole, ListenerSpec};

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, FileServerConfig, FilesConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StatsConfig, TlsConfig,
};

impl Config {
    /// Load configuration: defaults, then the file at `cli.config` (extension
    /// optional, may be missing), then `STATICD_*` environment variables, then
    /// command-line overrides
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("server.addr", ":8080")?
            .set_default("server.stats_tls", false)?
            .set_default("tls.cert_file", "./ssl-cert.pem")?
            .set_default("tls.key_file", "./ssl-cert.key")?
            .set_default("files.root", "/static")?
            .set_default("files.index_names", vec!["index.html"])?
            .set_default("files.generate_index_pages", true)?
            .set_default("files.compress", false)?
            .set_default("files.byte_range", false)?
            .set_default("files.vhost", false)?
            .set_default("files.show_hidden", false)?
            .set_default("files.cache_max_age", 86_400)?
            .set_default("files.compress_min_size", 256)?
            .set_default("stats.enabled", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .add_source(config::File::with_name(&cli.config).required(false))
            .add_source(
                config::Environment::with_prefix("STATICD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        cli.apply_overrides(builder)?.build()?.try_deserialize()
    }

    /// Whether `/stats` is routed on the file-serving listeners
    pub fn stats_route_enabled(&self) -> bool {
        self.stats.enabled && non_empty(self.server.stats_addr.as_deref()).is_none()
    }

    /// Every listener this configuration asks for
    pub fn listener_specs(&self) -> Result<Vec<ListenerSpec>, StartupError> {
        let mut specs = Vec::new();

        if let Some(addr) = non_empty(Some(&self.server.addr)) {
            specs.push(ListenerSpec {
                addr: parse_listen_addr(addr)?,
                tls: false,
                role: ListenerRole::Files,
            });
        }
        if let Some(addr) = non_empty(self.server.tls_addr.as_deref()) {
            specs.push(ListenerSpec {
                addr: parse_listen_addr(addr)?,
                tls: true,
                role: ListenerRole::Files,
            });
        }
        if self.stats.enabled {
            if let Some(addr) = non_empty(self.server.stats_addr.as_deref()) {
                specs.push(ListenerSpec {
                    addr: parse_listen_addr(addr)?,
                    tls: self.server.stats_tls,
                    role: ListenerRole::StatsOnly,
                });
            }
        }

        Ok(specs)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse `host:port`, or `:port` for every IPv4 interface
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, StartupError> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    full.parse().map_err(|source| StartupError::Address {
        addr: addr.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn load(args: &[&str]) -> Config {
        let mut argv = vec!["staticd", "--config", "does-not-exist"];
        argv.extend_from_slice(args);
        Config::load(&Cli::parse_from(argv)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&[]);
        assert_eq!(cfg.server.addr, ":8080");
        assert_eq!(cfg.files.index_names, vec!["index.html".to_string()]);
        assert!(cfg.files.generate_index_pages);
        assert!(!cfg.files.compress);
        assert!(!cfg.files.byte_range);
        assert!(cfg.stats.enabled);
        assert!(cfg.stats_route_enabled());
    }

    #[test]
    fn test_cli_overrides() {
        let cfg = load(&["--dir", "/srv/www", "--compress", "true", "--addr-stats", ":9090"]);
        assert_eq!(cfg.files.root, std::path::PathBuf::from("/srv/www"));
        assert!(cfg.files.compress);
        assert!(!cfg.stats_route_enabled());

        let specs = cfg.listener_specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].role, ListenerRole::StatsOnly);
        assert!(!specs[1].tls);
    }

    #[test]
    fn test_parse_listen_addr() {
        assert_eq!(
            parse_listen_addr(":8080").unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr("127.0.0.1:443").is_ok());
        assert!(parse_listen_addr("nonsense").is_err());
    }
}
