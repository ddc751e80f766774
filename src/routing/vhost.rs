//! Virtual host path rewriting
//!
//! Turns `GET /a.txt` with `Host: example.com` into `/example.com/a.txt`, so
//! each host is served from its own subdirectory of the root.

use std::sync::Arc;

/// Label used when the `Host` header is missing or unusable as a directory name
pub const INVALID_HOST: &str = "invalid-host";

/// Request path transform applied before resolution: `(path, host) -> path`
pub type PathRewrite = Arc<dyn Fn(&str, Option<&str>) -> String + Send + Sync>;

/// Rewriter prefixing the path with the host label
pub fn vhost_path_rewriter() -> PathRewrite {
    Arc::new(|path: &str, host: Option<&str>| format!("/{}{path}", host_label(host)))
}

/// Sanitize a `Host` header into a single path segment
///
/// The port is dropped and the name lowercased. Anything that is not a plain
/// DNS-style name falls back to [`INVALID_HOST`].
pub fn host_label(host: Option<&str>) -> String {
    let Some(host) = host.map(str::trim).filter(|h| !h.is_empty()) else {
        return INVALID_HOST.to_string();
    };

    let name = host.split(':').next().unwrap_or_default().to_ascii_lowercase();
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');

    if valid {
        name
    } else {
        INVALID_HOST.to_string()
    }
}
