//! Directory index pages
//!
//! Generated for directories without an index file. Entries are the
//! directory's immediate children sorted by name; directories carry a
//! trailing `/`. Dotfiles are left out unless `show_hidden` is set.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write as _;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

use crate::error::FileError;

/// Characters escaped inside one href path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug)]
struct Entry {
    name: String,
    is_dir: bool,
    size: u64,
    modified: Option<SystemTime>,
}

/// Render the listing of `dir`, served at the URL path `url_path`
pub async fn render(dir: &Path, url_path: &str, show_hidden: bool) -> Result<String, FileError> {
    let mut entries = read_entries(dir, show_hidden).await?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let base = if url_path.ends_with('/') {
        url_path.to_string()
    } else {
        format!("{url_path}/")
    };
    let title = escape_html(&base);

    let mut html = String::with_capacity(256 + entries.len() * 96);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Index of {title}</title>\n</head>\n<body>\n\
         <h1>Index of {title}</h1>\n<ul>\n"
    );

    if base != "/" {
        let parent = parent_href(&base);
        let _ = writeln!(html, "<li><a href=\"{parent}\">../</a></li>");
    }

    let base_href = encode_path(&base);
    for entry in &entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let href = format!(
            "{base_href}{}{suffix}",
            utf8_percent_encode(&entry.name, SEGMENT)
        );
        let size = if entry.is_dir {
            "-".to_string()
        } else {
            entry.size.to_string()
        };
        let modified = entry
            .modified
            .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<li><a href=\"{href}\">{}{suffix}</a> {size} {modified}</li>",
            escape_html(&entry.name)
        );
    }

    html.push_str("</ul>\n</body>\n</html>\n");
    Ok(html)
}

async fn read_entries(dir: &Path, show_hidden: bool) -> Result<Vec<Entry>, FileError> {
    let mut reader = fs::read_dir(dir).await.map_err(listing_error)?;
    let mut entries = Vec::new();

    while let Some(dir_entry) = reader.next_entry().await.map_err(listing_error)? {
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        // Follows symlinks; dangling ones are skipped
        let Ok(meta) = fs::metadata(dir_entry.path()).await else {
            continue;
        };
        entries.push(Entry {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        });
    }

    Ok(entries)
}

/// Listing failures are reported as missing or forbidden, never partial pages
fn listing_error(err: std::io::Error) -> FileError {
    match FileError::from_lookup(err) {
        FileError::Forbidden => FileError::Forbidden,
        _ => FileError::NotFound,
    }
}

fn parent_href(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    let parent = trimmed.rfind('/').map_or("/", |i| &trimmed[..=i]);
    encode_path(parent)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        std::fs::write(dir.path().join("a <x>.txt"), b"a").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"h").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/deep.txt"), b"d").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_render_sorted_listing() {
        let dir = populate();
        let html = render(dir.path(), "/files", false).await.unwrap();

        let a = html.find("a &lt;x&gt;.txt").unwrap();
        let b = html.find(">b.txt<").unwrap();
        let sub = html.find(">sub/<").unwrap();
        assert!(a < b && b < sub);

        assert!(html.contains("href=\"/files/a%20%3Cx%3E.txt\""));
        assert!(html.contains("href=\"/files/sub/\""));
        assert!(html.contains("<a href=\"/\">../</a>"));
        assert!(!html.contains(".hidden"));
        assert!(!html.contains("deep.txt"));
    }

    #[tokio::test]
    async fn test_render_hidden_and_root() {
        let dir = populate();
        let html = render(dir.path(), "/", true).await.unwrap();
        assert!(html.contains(".hidden"));
        assert!(!html.contains("../"));
    }

    #[tokio::test]
    async fn test_render_missing_directory() {
        let dir = populate();
        let result = render(&dir.path().join("gone"), "/gone/", false).await;
        assert!(matches!(result, Err(FileError::NotFound)));
    }

    #[test]
    fn test_parent_href() {
        assert_eq!(parent_href("/a/b/"), "/a/");
        assert_eq!(parent_href("/a/"), "/");
    }
}
