//! staticd: a static file serving HTTP daemon
//!
//! Files under one root directory are served over HTTP/1.1 (optionally
//! TLS) with conditional requests, byte ranges, transparent compression,
//! generated directory listings and per-host document roots. Request
//! outcome counters are exposed as JSON.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod stats;
