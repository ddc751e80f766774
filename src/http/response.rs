//! HTTP response building module
//!
//! Provides builders for the file handler's responses, decoupled from the
//! request-processing logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, LAST_MODIFIED, VARY,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use super::cache::{CachePolicy, CacheValidators};
use super::range::ByteRange;
use crate::error::FileError;

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Headers shared by 200 and 206 file responses
#[derive(Debug, Clone)]
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    /// Absent for generated index pages
    pub validators: Option<&'a CacheValidators>,
    pub cache_policy: CachePolicy,
    /// `Some(true)` advertises `bytes`, `Some(false)` advertises `none`
    pub accept_ranges: Option<bool>,
    pub content_encoding: Option<&'static str>,
    /// Add `Vary: Accept-Encoding`
    pub vary_encoding: bool,
}

impl FileHeaders<'_> {
    fn apply(&self, mut builder: Builder) -> Builder {
        builder = builder
            .header(CONTENT_TYPE, self.content_type)
            .header(CACHE_CONTROL, self.cache_policy.to_header_value());
        if let Some(validators) = self.validators {
            builder = builder
                .header(ETAG, validators.etag.as_str())
                .header(LAST_MODIFIED, validators.last_modified.as_str());
        }
        if let Some(accept) = self.accept_ranges {
            builder = builder.header(ACCEPT_RANGES, if accept { "bytes" } else { "none" });
        }
        if let Some(encoding) = self.content_encoding {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        if self.vary_encoding {
            builder = builder.header(VARY, "Accept-Encoding");
        }
        builder
    }
}

/// Build 200 OK response
///
/// `content_length` is given separately so HEAD responses can carry an empty body.
pub fn build_full_response(
    headers: &FileHeaders<'_>,
    body: Bytes,
    content_length: u64,
) -> Response<Full<Bytes>> {
    headers
        .apply(Response::builder().status(StatusCode::OK))
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    headers: &FileHeaders<'_>,
    body: Bytes,
    range: ByteRange,
    total_size: u64,
) -> Response<Full<Bytes>> {
    headers
        .apply(Response::builder().status(StatusCode::PARTIAL_CONTENT))
        .header(CONTENT_LENGTH, range.len())
        .header(CONTENT_RANGE, range.content_range(total_size))
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response, keeping the caching headers
pub fn build_304_response(
    validators: &CacheValidators,
    cache_policy: CachePolicy,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, validators.etag.as_str())
        .header(LAST_MODIFIED, validators.last_modified.as_str())
        .header(CACHE_CONTROL, cache_policy.to_header_value())
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build the minimal response terminating a failed request
pub fn build_error_response(err: &FileError) -> Response<Full<Bytes>> {
    if let FileError::RangeNotSatisfiable { size } = err {
        return build_416_response(*size);
    }

    let status = err.status();
    let message = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8");
    if matches!(err, FileError::MethodNotAllowed) {
        builder = builder.header(ALLOW, ALLOWED_METHODS);
    }

    builder
        .body(Full::new(Bytes::from(message)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_error_responses() {
        let resp = build_error_response(&FileError::NotFound);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = build_error_response(&FileError::MethodNotAllowed);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], ALLOWED_METHODS);

        let resp = build_error_response(&FileError::RangeNotSatisfiable { size: 42 });
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */42");
    }

    #[test]
    fn test_304_keeps_cache_headers() {
        let validators = CacheValidators::new(10, UNIX_EPOCH + Duration::from_secs(60));
        let resp = build_304_response(&validators, CachePolicy::Public(600));
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[ETAG], validators.etag.as_str());
        assert_eq!(resp.headers()[LAST_MODIFIED], "Thu, 01 Jan 1970 00:01:00 GMT");
        assert_eq!(resp.headers()[CACHE_CONTROL], "public, max-age=600");
    }

    #[test]
    fn test_partial_headers() {
        let headers = FileHeaders {
            content_type: "text/plain; charset=utf-8",
            validators: None,
            cache_policy: CachePolicy::NoCache,
            accept_ranges: Some(true),
            content_encoding: None,
            vary_encoding: false,
        };
        let range = ByteRange { start: 2, end: 5 };
        let resp = build_partial_response(&headers, Bytes::from_static(b"cdef"), range, 10);
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 2-5/10");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "4");
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
    }
}
