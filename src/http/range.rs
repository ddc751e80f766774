//! HTTP Range request parsing module
//!
//! Single-range `bytes` requests for resumable downloads, per RFC 7233.

use hyper::header::RANGE;
use hyper::HeaderMap;

/// Satisfiable byte interval, both ends inclusive
///
/// Always `start <= end < file_size` for the file it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value, e.g. `bytes 0-99/1000`
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{file_size}", self.start, self.end)
    }
}

/// Range negotiation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header, or ranges disabled: send everything
    Full,
    /// Send this slice with 206
    Partial(ByteRange),
    /// Range lies outside the file - should return 416
    NotSatisfiable,
    /// Multi-range request; served as `Full`
    Unsupported,
}

/// Negotiate the body slice for a request
///
/// Always `Full` when byte ranges are disabled.
pub fn negotiate(headers: &HeaderMap, file_size: u64, enabled: bool) -> RangeOutcome {
    if !enabled {
        return RangeOutcome::Full;
    }
    let range_header = headers.get(RANGE).and_then(|v| v.to_str().ok());
    parse_range_header(range_header, file_size)
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use staticd::http::range::{parse_range_header, RangeOutcome};
///
/// // Fixed range
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert!(matches!(result, RangeOutcome::Partial(_)));
///
/// // No Range header
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeOutcome::Full));
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeOutcome {
    let Some(header) = range_header else {
        return RangeOutcome::Full;
    };

    let Some(header) = header.trim().strip_prefix("bytes=") else {
        return RangeOutcome::Full; // Not bytes unit, ignore
    };

    if header.contains(',') {
        return RangeOutcome::Unsupported;
    }

    let Some((start_str, end_str)) = header.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix range: "-500" means last 500 bytes
    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }

    // Standard range: "start-" or "start-end"
    parse_standard_range(start_str, end_str, file_size)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: u64) -> RangeOutcome {
    let Ok(suffix) = suffix_str.parse::<u64>() else {
        return RangeOutcome::Full;
    };

    if suffix == 0 || file_size == 0 {
        return RangeOutcome::NotSatisfiable;
    }

    // Suffix larger than file is valid, just return whole file as range
    RangeOutcome::Partial(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: u64) -> RangeOutcome {
    let Ok(start) = start_str.parse::<u64>() else {
        return RangeOutcome::Full;
    };

    // Start beyond file size is not satisfiable
    if start >= file_size {
        return RangeOutcome::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        file_size - 1 // Open-ended range
    } else {
        let Ok(e) = end_str.parse::<u64>() else {
            return RangeOutcome::Full;
        };
        // Clamp end to file size - 1
        e.min(file_size - 1)
    };

    if start > end {
        return RangeOutcome::NotSatisfiable;
    }

    RangeOutcome::Partial(ByteRange { start, end })
}
