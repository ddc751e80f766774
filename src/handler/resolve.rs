//! Request path resolution
//!
//! Maps a request path onto the served root: percent-decoding, `..`
//! collapsing, optional virtual-host rewriting and index-file lookup.

use percent_encoding::percent_decode_str;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

use crate::config::FileServerConfig;
use crate::error::FileError;
use crate::http::mime;
use crate::logger;
use crate::routing::{vhost_path_rewriter, PathRewrite};

/// What a resolved path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file, possibly an index file found inside a directory
    File,
    /// A directory without an index file; the listing is generated
    SyntheticIndex,
}

/// A request path resolved to the filesystem, valid for one request
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub kind: FileKind,
    pub size: u64,
    pub modified: SystemTime,
    pub content_type: &'static str,
}

impl ResolvedFile {
    fn from_metadata(path: PathBuf, kind: FileKind, meta: &Metadata) -> Self {
        let content_type = match kind {
            FileKind::File => mime::content_type_for(&path),
            FileKind::SyntheticIndex => "text/html; charset=utf-8",
        };
        Self {
            size: if kind == FileKind::File { meta.len() } else { 0 },
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
            path,
            kind,
            content_type,
        }
    }
}

/// Resolves request paths below a fixed root directory
pub struct PathResolver {
    root: PathBuf,
    index_names: Vec<String>,
    generate_index_pages: bool,
    rewrite: Option<PathRewrite>,
}

impl PathResolver {
    /// Build a resolver for `config.root`, which must exist
    pub fn new(config: &FileServerConfig) -> std::io::Result<Self> {
        let rewrite = config.vhost.then(|| vhost_path_rewriter());
        Self::with_rewrite(config, rewrite)
    }

    /// Build a resolver with a custom path transform
    pub fn with_rewrite(
        config: &FileServerConfig,
        rewrite: Option<PathRewrite>,
    ) -> std::io::Result<Self> {
        Ok(Self {
            root: config.root.canonicalize()?,
            index_names: config.index_names.clone(),
            generate_index_pages: config.generate_index_pages,
            rewrite,
        })
    }

    /// Resolve a request path (query string allowed) to a file or listing
    pub async fn resolve(
        &self,
        request_path: &str,
        host: Option<&str>,
    ) -> Result<ResolvedFile, FileError> {
        let raw = request_path
            .split_once('?')
            .map_or(request_path, |(path, _)| path);

        let mut clean = sanitize_path(raw)?;
        if let Some(rewrite) = &self.rewrite {
            clean = sanitize_path(&rewrite(&clean, host))?;
        }

        let candidate = clean
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, seg| acc.join(seg));

        let meta = fs::metadata(&candidate)
            .await
            .map_err(FileError::from_lookup)?;

        let resolved = if meta.is_dir() {
            self.resolve_directory(candidate, &meta).await?
        } else if meta.is_file() {
            ResolvedFile::from_metadata(candidate, FileKind::File, &meta)
        } else {
            return Err(FileError::NotFound);
        };

        self.ensure_within_root(request_path, &resolved.path).await?;
        Ok(resolved)
    }

    async fn resolve_directory(
        &self,
        dir: PathBuf,
        dir_meta: &Metadata,
    ) -> Result<ResolvedFile, FileError> {
        for index_name in &self.index_names {
            let index_path = dir.join(index_name);
            if let Ok(meta) = fs::metadata(&index_path).await {
                if meta.is_file() {
                    return Ok(ResolvedFile::from_metadata(
                        index_path,
                        FileKind::File,
                        &meta,
                    ));
                }
            }
        }

        if self.generate_index_pages {
            Ok(ResolvedFile::from_metadata(
                dir,
                FileKind::SyntheticIndex,
                dir_meta,
            ))
        } else {
            Err(FileError::NotFound)
        }
    }

    /// Reject paths that leave the root through a symlink
    async fn ensure_within_root(&self, request_path: &str, path: &Path) -> Result<(), FileError> {
        let canonical = fs::canonicalize(path)
            .await
            .map_err(FileError::from_lookup)?;
        if canonical.starts_with(&self.root) {
            Ok(())
        } else {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                request_path,
                canonical.display()
            ));
            Err(FileError::Forbidden)
        }
    }
}

/// Decode and normalize a request path
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// A `..` with nothing left to remove, a NUL, a backslash or an undecodable
/// escape is `Forbidden`.
pub fn sanitize_path(raw: &str) -> Result<String, FileError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| FileError::Forbidden)?;
    if decoded.contains('\0') || decoded.contains('\\') {
        return Err(FileError::Forbidden);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FileError::Forbidden);
                }
            }
            s => segments.push(s),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sanitize_collapses() {
        assert_eq!(sanitize_path("/").unwrap(), "/");
        assert_eq!(sanitize_path("//a/./b/").unwrap(), "/a/b");
        assert_eq!(sanitize_path("/a/../b").unwrap(), "/b");
        assert_eq!(sanitize_path("/hello%20world.txt").unwrap(), "/hello world.txt");
    }

    #[test]
    fn test_sanitize_rejects_escape() {
        assert!(matches!(sanitize_path("/../etc/passwd"), Err(FileError::Forbidden)));
        assert!(matches!(sanitize_path("/a/../../x"), Err(FileError::Forbidden)));
        assert!(matches!(sanitize_path("/%2e%2e/x"), Err(FileError::Forbidden)));
        assert!(matches!(sanitize_path("/a%2f..%2f..%2fx"), Err(FileError::Forbidden)));
        assert!(matches!(sanitize_path("/a%00b"), Err(FileError::Forbidden)));
        assert!(matches!(sanitize_path("/..\\x"), Err(FileError::Forbidden)));
        assert!(matches!(sanitize_path("/%ff"), Err(FileError::Forbidden)));
    }

    fn setup() -> (tempfile::TempDir, FileServerConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), b"<h1>docs</h1>").unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let config = FileServerConfig::new(dir.path());
        (dir, config)
    }

    #[tokio::test]
    async fn test_resolve_file() {
        let (_dir, config) = setup();
        let resolver = PathResolver::new(&config).unwrap();

        let file = resolver.resolve("/a.txt?x=1", None).await.unwrap();
        assert_eq!(file.kind, FileKind::File);
        assert_eq!(file.size, 5);
        assert_eq!(file.content_type, "text/plain; charset=utf-8");
        assert!(file.path.ends_with("a.txt"));
    }

    #[tokio::test]
    async fn test_resolve_directory() {
        let (_dir, mut config) = setup();
        let resolver = PathResolver::new(&config).unwrap();

        let index = resolver.resolve("/docs/", None).await.unwrap();
        assert_eq!(index.kind, FileKind::File);
        assert!(index.path.ends_with("docs/index.html"));

        let listing = resolver.resolve("/empty", None).await.unwrap();
        assert_eq!(listing.kind, FileKind::SyntheticIndex);

        config.generate_index_pages = false;
        let resolver = PathResolver::new(&config).unwrap();
        assert!(matches!(
            resolver.resolve("/empty", None).await,
            Err(FileError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_resolve_missing_and_forbidden() {
        let (_dir, config) = setup();
        let resolver = PathResolver::new(&config).unwrap();

        assert!(matches!(
            resolver.resolve("/nope.txt", None).await,
            Err(FileError::NotFound)
        ));
        assert!(matches!(
            resolver.resolve("/a.txt/inner", None).await,
            Err(FileError::NotFound)
        ));
        assert!(matches!(
            resolver.resolve("/../a.txt", None).await,
            Err(FileError::Forbidden)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_forbidden() {
        let (dir, config) = setup();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), b"s").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), dir.path().join("link"))
            .unwrap();

        let resolver = PathResolver::new(&config).unwrap();
        assert!(matches!(
            resolver.resolve("/link", None).await,
            Err(FileError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_vhost_prefix() {
        let (dir, mut config) = setup();
        std::fs::create_dir(dir.path().join("example.com")).unwrap();
        std::fs::write(dir.path().join("example.com/page.txt"), b"vhost").unwrap();
        config.vhost = true;
        let resolver = PathResolver::new(&config).unwrap();

        let file = resolver
            .resolve("/page.txt", Some("Example.com:8080"))
            .await
            .unwrap();
        assert_eq!(file.size, 5);

        // `..` cannot climb out of the host directory
        assert!(matches!(
            resolver.resolve("/../a.txt", Some("example.com")).await,
            Err(FileError::Forbidden)
        ));
        assert!(matches!(
            resolver.resolve("/page.txt", None).await,
            Err(FileError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_custom_rewrite() {
        let (_dir, config) = setup();
        let rewrite: PathRewrite = Arc::new(|path: &str, _host: Option<&str>| format!("/docs{path}"));
        let resolver = PathResolver::with_rewrite(&config, Some(rewrite)).unwrap();

        let file = resolver.resolve("/index.html", None).await.unwrap();
        assert!(file.path.ends_with("docs/index.html"));
    }
}
