//! Request counters
//!
//! Process-wide outcome counters for the file handler. One registry is built
//! at startup and shared by reference with every listener.

use hyper::StatusCode;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub const FS_CALLS: &str = "fsCalls";
pub const FS_OK_RESPONSES: &str = "fsOKResponses";
pub const FS_NOT_MODIFIED_RESPONSES: &str = "fsNotModifiedResponses";
pub const FS_NOT_FOUND_RESPONSES: &str = "fsNotFoundResponses";
pub const FS_OTHER_RESPONSES: &str = "fsOtherResponses";
pub const FS_RESPONSE_BODY_BYTES: &str = "fsResponseBodyBytes";

/// Monotonic counters, updated once per handled request
#[derive(Debug, Default)]
pub struct StatsRegistry {
    calls: AtomicU64,
    ok: AtomicU64,
    not_modified: AtomicU64,
    not_found: AtomicU64,
    other: AtomicU64,
    body_bytes: AtomicU64,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished request
    ///
    /// `body_bytes` only counts towards the total for 200 responses.
    pub fn increment(&self, status: StatusCode, body_bytes: u64) {
        self.calls.fetch_add(1, Ordering::Relaxed);

        match status {
            StatusCode::OK => {
                self.ok.fetch_add(1, Ordering::Relaxed);
                self.body_bytes.fetch_add(body_bytes, Ordering::Relaxed);
            }
            StatusCode::NOT_MODIFIED => {
                self.not_modified.fetch_add(1, Ordering::Relaxed);
            }
            StatusCode::NOT_FOUND => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.other.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Current value of every counter, keyed by name
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        BTreeMap::from([
            (FS_CALLS, self.calls.load(Ordering::Relaxed)),
            (FS_OK_RESPONSES, self.ok.load(Ordering::Relaxed)),
            (
                FS_NOT_MODIFIED_RESPONSES,
                self.not_modified.load(Ordering::Relaxed),
            ),
            (FS_NOT_FOUND_RESPONSES, self.not_found.load(Ordering::Relaxed)),
            (FS_OTHER_RESPONSES, self.other.load(Ordering::Relaxed)),
            (FS_RESPONSE_BODY_BYTES, self.body_bytes.load(Ordering::Relaxed)),
        ])
    }

    /// Snapshot restricted to counters whose name contains `filter`
    pub fn filtered_snapshot(&self, filter: Option<&str>) -> BTreeMap<&'static str, u64> {
        let mut snapshot = self.snapshot();
        if let Some(needle) = filter.filter(|f| !f.is_empty()) {
            snapshot.retain(|name, _| name.contains(needle));
        }
        snapshot
    }
}
