//! HTTP cache control module
//!
//! Provides `ETag`/`Last-Modified` generation and conditional request handling.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use hyper::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use hyper::HeaderMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators for one file, computed from its size and modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValidators {
    pub etag: String,
    pub last_modified: String,
    /// Modification time, whole seconds since the Unix epoch
    pub modified_secs: i64,
}

impl CacheValidators {
    pub fn new(size: u64, modified: SystemTime) -> Self {
        let modified_secs = unix_seconds(modified);
        Self {
            etag: generate_etag(size, modified_secs),
            last_modified: format_http_date(modified_secs),
            modified_secs,
        }
    }
}

/// Result of evaluating a conditional request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Client copy is current: answer 304
    NotModified,
    /// Serve the representation
    Proceed,
}

/// Decide between 304 and a full response
///
/// A matching `If-None-Match`, or an `If-Modified-Since` at or after the
/// file's modification second, yields `NotModified`.
pub fn evaluate(headers: &HeaderMap, validators: &CacheValidators) -> CacheOutcome {
    let if_none_match = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok());
    if check_etag_match(if_none_match, &validators.etag) {
        return CacheOutcome::NotModified;
    }

    let if_modified_since = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date);
    match if_modified_since {
        Some(since) if since >= validators.modified_secs => CacheOutcome::NotModified,
        _ => CacheOutcome::Proceed,
    }
}

/// Weak `ETag` derived from size and whole-second modification time
///
/// # Returns
/// Weak quoted `ETag` string, e.g., `W/"abc123def"`
pub fn generate_etag(size: u64, modified_secs: i64) -> String {
    let mut hasher = DefaultHasher::new();
    size.hash(&mut hasher);
    modified_secs.hash(&mut hasher);
    let v = hasher.finish();
    format!("W/\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// Comparison is weak: a `W/` prefix on either side is ignored.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = strip_weak(etag);
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || strip_weak(e) == ours
        })
    })
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Format seconds since the epoch as an IMF-fixdate
pub fn format_http_date(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or_default()
        .format(HTTP_DATE_FORMAT)
        .to_string()
}

/// Parse an HTTP date (IMF-fixdate, RFC 850 or asctime) into epoch seconds
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.timestamp());
    }
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc().timestamp())
}

fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds)
    Public(u32),
    /// Revalidate on every use
    NoCache,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::NoCache => "no-cache".to_string(),
        }
    }
}
