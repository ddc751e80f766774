//! Transparent response compression
//!
//! gzip and deflate via `flate2`. Compressed bodies are cached per
//! (file, encoding) together with the modification time they were built
//! from, so a changed file is recompressed instead of served stale.

use dashmap::DashMap;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use hyper::body::Bytes;
use hyper::header::ACCEPT_ENCODING;
use hyper::HeaderMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use super::resolve::ResolvedFile;
use crate::http::mime;
use crate::logger;

/// Supported content codings, in server preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Gzip,
    Deflate,
}

impl Encoding {
    const PREFERENCE: [Self; 2] = [Self::Gzip, Self::Deflate];

    /// Get the content-encoding header value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedBody {
    modified: SystemTime,
    bytes: Bytes,
}

/// Compresses file bodies and caches the results
pub struct CompressionEncoder {
    min_size: u64,
    cache: DashMap<(PathBuf, Encoding), CachedBody>,
}

impl CompressionEncoder {
    pub fn new(min_size: u64) -> Self {
        Self {
            min_size,
            cache: DashMap::new(),
        }
    }

    /// Whether a file of this type and size is worth compressing at all
    pub fn is_candidate(&self, file: &ResolvedFile) -> bool {
        file.size >= self.min_size && mime::is_compressible(file.content_type)
    }

    /// Compress `body` if the client accepts a supported coding
    ///
    /// Returns the body to send and its `Content-Encoding`, if any. A failed
    /// compression falls back to the identity body.
    pub async fn maybe_compress(
        &self,
        headers: &HeaderMap,
        file: &ResolvedFile,
        body: Bytes,
    ) -> (Bytes, Option<&'static str>) {
        if !self.is_candidate(file) {
            return (body, None);
        }
        let Some(encoding) = accepted_encoding(headers) else {
            return (body, None);
        };

        match self.encode(file, encoding, body.clone()).await {
            Ok(compressed) => (compressed, Some(encoding.as_str())),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to {} '{}': {e}",
                    encoding.as_str(),
                    file.path.display()
                ));
                (body, None)
            }
        }
    }

    async fn encode(
        &self,
        file: &ResolvedFile,
        encoding: Encoding,
        body: Bytes,
    ) -> std::io::Result<Bytes> {
        let key = (file.path.clone(), encoding);
        if let Some(hit) = self.cache.get(&key) {
            if hit.modified == file.modified {
                return Ok(hit.bytes.clone());
            }
        }

        let compressed = tokio::task::spawn_blocking(move || compress(&body, encoding))
            .await
            .map_err(std::io::Error::other)??;
        let compressed = Bytes::from(compressed);

        self.cache.insert(
            key,
            CachedBody {
                modified: file.modified,
                bytes: compressed.clone(),
            },
        );
        Ok(compressed)
    }

    #[cfg(test)]
    fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// The coding a request's `Accept-Encoding` selects, if any
pub fn accepted_encoding(headers: &HeaderMap) -> Option<Encoding> {
    negotiate_encoding(headers.get(ACCEPT_ENCODING).and_then(|v| v.to_str().ok()))
}

/// Compress a buffer with the given coding
pub fn compress(data: &[u8], encoding: Encoding) -> std::io::Result<Vec<u8>> {
    match encoding {
        Encoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Encoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Pick the coding to use from an `Accept-Encoding` header
///
/// Highest q-value wins, ties go to the server preference (gzip first);
/// `q=0` excludes a coding and `*` covers codings not listed.
pub fn negotiate_encoding(accept_encoding: Option<&str>) -> Option<Encoding> {
    let accept = accept_encoding?;

    let mut wildcard = None;
    let mut explicit: Vec<(String, u16)> = Vec::new();
    for item in accept.split(',') {
        let mut parts = item.split(';');
        let coding = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if coding.is_empty() {
            continue;
        }
        let q = parts
            .find_map(|p| p.trim().strip_prefix("q="))
            .map_or(Some(1000), parse_qvalue)
            .unwrap_or(0);
        if coding == "*" {
            wildcard = Some(q);
        } else {
            explicit.push((coding, q));
        }
    }

    let mut best: Option<(Encoding, u16)> = None;
    for encoding in Encoding::PREFERENCE {
        let q = explicit
            .iter()
            .find(|(c, _)| c == encoding.as_str() || (encoding == Encoding::Gzip && c == "x-gzip"))
            .map(|(_, q)| *q)
            .or(wildcard)
            .unwrap_or(0);
        if q > 0 && best.map_or(true, |(_, best_q)| q > best_q) {
            best = Some((encoding, q));
        }
    }
    best.map(|(encoding, _)| encoding)
}

/// Parse a q-value (`0`, `0.5`, `1.000`) into thousandths
fn parse_qvalue(value: &str) -> Option<u16> {
    let (int, frac) = value.trim().split_once('.').unwrap_or((value.trim(), ""));
    if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let int: u16 = match int {
        "0" => 0,
        "1" => 1,
        _ => return None,
    };
    let frac: u16 = format!("{frac:0<3}").parse().ok()?;
    let q = int * 1000 + frac;
    (q <= 1000).then_some(q)
}
