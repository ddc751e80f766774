//! Static file serving module
//!
//! `FileHandler` drives one request through resolution, cache validation,
//! range negotiation and compression, then records the outcome in the
//! shared counters.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::HOST;
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::compress::{self, CompressionEncoder};
use super::index;
use super::resolve::{sanitize_path, FileKind, PathResolver, ResolvedFile};
use crate::config::FileServerConfig;
use crate::error::FileError;
use crate::http::response::{build_full_response, build_options_response, build_partial_response};
use crate::http::{
    self, cache, range, ByteRange, CacheOutcome, CachePolicy, CacheValidators, FileHeaders,
    RangeOutcome,
};
use crate::logger;
use crate::routing::PathRewrite;
use crate::stats::StatsRegistry;

/// Serves files below one root directory
pub struct FileHandler {
    config: FileServerConfig,
    resolver: PathResolver,
    encoder: CompressionEncoder,
    stats: Arc<StatsRegistry>,
}

impl FileHandler {
    /// Create a handler for `config.root`, which must exist
    pub fn new(config: FileServerConfig, stats: Arc<StatsRegistry>) -> std::io::Result<Self> {
        let resolver = PathResolver::new(&config)?;
        Ok(Self::from_resolver(config, resolver, stats))
    }

    /// Create a handler with a custom path transform instead of the
    /// configured virtual-host rewrite
    pub fn with_rewrite(
        config: FileServerConfig,
        rewrite: Option<PathRewrite>,
        stats: Arc<StatsRegistry>,
    ) -> std::io::Result<Self> {
        let resolver = PathResolver::with_rewrite(&config, rewrite)?;
        Ok(Self::from_resolver(config, resolver, stats))
    }

    fn from_resolver(
        config: FileServerConfig,
        resolver: PathResolver,
        stats: Arc<StatsRegistry>,
    ) -> Self {
        Self {
            encoder: CompressionEncoder::new(config.compress_min_size),
            config,
            resolver,
            stats,
        }
    }

    pub const fn config(&self) -> &FileServerConfig {
        &self.config
    }

    /// Serve a request; its body is ignored
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let (parts, _) = req.into_parts();
        self.handle_parts(&parts).await
    }

    /// Serve a request head and count the outcome exactly once
    pub async fn handle_parts(&self, req: &Parts) -> Response<Full<Bytes>> {
        let response = match self.serve(req).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    FileError::Internal(e) => {
                        logger::log_error(&format!("Failed to serve '{}': {e}", req.uri.path()));
                    }
                    FileError::Forbidden => {
                        logger::log_warning(&format!("Forbidden: {}", req.uri.path()));
                    }
                    _ => {}
                }
                http::build_error_response(&err)
            }
        };

        let sent = response.body().size_hint().exact().unwrap_or(0);
        self.stats.increment(response.status(), sent);
        response
    }

    async fn serve(&self, req: &Parts) -> Result<Response<Full<Bytes>>, FileError> {
        let is_head = match req.method {
            Method::GET => false,
            Method::HEAD => true,
            Method::OPTIONS => return Ok(build_options_response()),
            _ => return Err(FileError::MethodNotAllowed),
        };

        let host = req
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| req.uri.host());
        let path_and_query = req
            .uri
            .path_and_query()
            .map_or_else(|| req.uri.path(), |pq| pq.as_str());

        let file = self.resolver.resolve(path_and_query, host).await?;

        match file.kind {
            FileKind::SyntheticIndex => self.serve_index(req, &file, is_head).await,
            FileKind::File => self.serve_file(req, &file, is_head).await,
        }
    }

    /// Generated listing: never validated, ranged or compressed
    async fn serve_index(
        &self,
        req: &Parts,
        dir: &ResolvedFile,
        is_head: bool,
    ) -> Result<Response<Full<Bytes>>, FileError> {
        let url_path = sanitize_path(req.uri.path())?;
        let html = index::render(&dir.path, &url_path, self.config.show_hidden).await?;
        let length = html.len() as u64;

        let headers = FileHeaders {
            content_type: dir.content_type,
            validators: None,
            cache_policy: CachePolicy::NoCache,
            accept_ranges: None,
            content_encoding: None,
            vary_encoding: false,
        };
        let body = if is_head { Bytes::new() } else { Bytes::from(html) };
        Ok(build_full_response(&headers, body, length))
    }

    async fn serve_file(
        &self,
        req: &Parts,
        file: &ResolvedFile,
        is_head: bool,
    ) -> Result<Response<Full<Bytes>>, FileError> {
        let validators = CacheValidators::new(file.size, file.modified);
        let cache_policy = CachePolicy::Public(self.config.cache_max_age);

        if cache::evaluate(&req.headers, &validators) == CacheOutcome::NotModified {
            return Ok(http::build_304_response(&validators, cache_policy));
        }

        let compressible = self.config.compress && self.encoder.is_candidate(file);
        let mut headers = FileHeaders {
            content_type: file.content_type,
            validators: Some(&validators),
            cache_policy,
            accept_ranges: Some(self.config.accept_byte_range),
            content_encoding: None,
            vary_encoding: compressible,
        };

        match range::negotiate(&req.headers, file.size, self.config.accept_byte_range) {
            RangeOutcome::NotSatisfiable => {
                Err(FileError::RangeNotSatisfiable { size: file.size })
            }
            RangeOutcome::Partial(range) => {
                let body = if is_head {
                    Bytes::new()
                } else {
                    read_range(&file.path, range).await?
                };
                Ok(build_partial_response(&headers, body, range, file.size))
            }
            RangeOutcome::Full | RangeOutcome::Unsupported => {
                // HEAD reads the file only to report an encoded length
                let encode = compressible && compress::accepted_encoding(&req.headers).is_some();
                if is_head && !encode {
                    return Ok(build_full_response(&headers, Bytes::new(), file.size));
                }

                let body = Bytes::from(fs::read(&file.path).await?);
                let body = if encode {
                    let (body, encoding) =
                        self.encoder.maybe_compress(&req.headers, file, body).await;
                    headers.content_encoding = encoding;
                    body
                } else {
                    body
                };

                let length = body.len() as u64;
                let body = if is_head { Bytes::new() } else { body };
                Ok(build_full_response(&headers, body, length))
            }
        }
    }
}

/// Read exactly the bytes covered by `range`
async fn read_range(path: &Path, range: ByteRange) -> std::io::Result<Bytes> {
    let len = usize::try_from(range.len()).map_err(std::io::Error::other)?;
    let mut file = fs::File::open(path).await?;
    file.seek(SeekFrom::Start(range.start)).await?;

    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;

    fn handler(config: FileServerConfig) -> FileHandler {
        FileHandler::new(config, Arc::new(StatsRegistry::new())).unwrap()
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn test_method_handling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let handler = handler(FileServerConfig::new(dir.path()));

        let post = Request::builder()
            .method(Method::POST)
            .uri("/a.txt")
            .body(())
            .unwrap();
        assert_eq!(
            handler.handle(post).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );

        let head = Request::builder()
            .method(Method::HEAD)
            .uri("/a.txt")
            .body(())
            .unwrap();
        let resp = handler.handle(head).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "5");
        assert_eq!(resp.body().size_hint().exact(), Some(0));
    }

    #[tokio::test]
    async fn test_accept_ranges_advertised() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let resp = handler(FileServerConfig::new(dir.path()))
            .handle(get("/a.txt"))
            .await;
        assert_eq!(resp.headers()["accept-ranges"], "none");

        let mut config = FileServerConfig::new(dir.path());
        config.accept_byte_range = true;
        let resp = handler(config).handle(get("/a.txt")).await;
        assert_eq!(resp.headers()["accept-ranges"], "bytes");
    }

    #[tokio::test]
    async fn test_read_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits");
        std::fs::write(&path, b"0123456789").unwrap();

        let bytes = read_range(&path, ByteRange { start: 3, end: 6 }).await.unwrap();
        assert_eq!(&bytes[..], b"3456");
    }
}
