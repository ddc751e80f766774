//! MIME type detection module
//!
//! Guesses the Content-Type from the file extension and decides which
//! types are worth compressing.

use std::path::Path;

/// Content-Type for a file path, guessed from its (case-insensitive) extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    by_extension(extension.as_deref())
}

/// Whether a response of this Content-Type shrinks under gzip/deflate
pub fn is_compressible(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.starts_with("text/")
        || matches!(
            essence,
            "application/javascript"
                | "application/json"
                | "application/xml"
                | "application/wasm"
                | "image/svg+xml"
                | "image/x-icon"
        )
}

/// Extension to Content-Type, lowercase extensions
const TYPES: &[(&str, &str)] = &[
    ("avi", "video/x-msvideo"),
    ("css", "text/css; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("eot", "application/vnd.ms-fontobject"),
    ("flac", "audio/flac"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("ico", "image/x-icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("m4a", "audio/mp4"),
    ("map", "application/json"),
    ("md", "text/markdown; charset=utf-8"),
    ("mjs", "application/javascript"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("otf", "font/otf"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("ttf", "font/ttf"),
    ("txt", "text/plain; charset=utf-8"),
    ("wasm", "application/wasm"),
    ("wav", "audio/wav"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

const DEFAULT_TYPE: &str = "application/octet-stream";

/// Content-Type for a lowercase extension
///
/// # Examples
/// ```
/// use staticd::http::mime::by_extension;
/// assert_eq!(by_extension(Some("html")), "text/html; charset=utf-8");
/// assert_eq!(by_extension(Some("mp4")), "video/mp4");
/// assert_eq!(by_extension(None), "application/octet-stream");
/// ```
pub fn by_extension(extension: Option<&str>) -> &'static str {
    extension
        .and_then(|ext| {
            TYPES
                .binary_search_by(|(known, _)| (*known).cmp(ext))
                .ok()
        })
        .map_or(DEFAULT_TYPE, |i| TYPES[i].1)
}
