//! Error types
//!
//! `FileError` terminates a single request with a status code;
//! `StartupError` is fatal to the process.

use hyper::StatusCode;
use thiserror::Error;

/// Request-path failure, one variant per response status
#[derive(Error, Debug)]
pub enum FileError {
    /// Path escapes the root, or the filesystem denied access
    #[error("forbidden")]
    Forbidden,

    /// No such file or directory, and no applicable index
    #[error("not found")]
    NotFound,

    /// Requested byte range lies outside the file
    #[error("range not satisfiable for {size} byte file")]
    RangeNotSatisfiable { size: u64 },

    /// Method other than GET, HEAD or OPTIONS
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Unexpected I/O failure on a resolved file
    #[error("internal failure: {0}")]
    Internal(#[from] std::io::Error),
}

impl FileError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a filesystem error raised while resolving a path
    pub fn from_lookup(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => Self::NotFound,
            ErrorKind::PermissionDenied => Self::Forbidden,
            _ => Self::Internal(err),
        }
    }
}

/// Fatal startup failure
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
