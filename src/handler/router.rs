//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: picks the stats endpoint or the
//! file handler for a listener, then writes the access log line.

use crate::api;
use crate::config::AppState;
use crate::logger::{self, AccessLogEntry};
use crate::server::ListenerRole;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    role: ListenerRole,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let stats_request = match role {
        ListenerRole::StatsOnly => true,
        ListenerRole::Files => state.stats_route && parts.uri.path() == api::STATS_PATH,
    };

    let response = if stats_request {
        api::handle_stats(&parts, &state.stats)
    } else {
        state.files.handle_parts(&parts).await
    };

    if state.access_log {
        let listener = if stats_request { "stats" } else { "files" };
        let mut entry = AccessLogEntry::from_request(&parts, remote_addr, listener);
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}
