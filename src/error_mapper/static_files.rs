//! Static asset fallback for module public files.
//!
//! # Responsibilities
//! - Recognize `module/<name>/public/<rest>` paths of configured modules
//! - Refuse traversal (`..`, `.`, empty segments, backslashes, NUL)
//! - Read the file and pick a content type
//!
//! # Design Decisions
//! - Only consulted after routing failed to find (or exhausted) a route
//! - The resolved file must stay inside the module's `public/` directory
//!   after symlinks are resolved
//! - Content is sniffed first; generic sniff results defer to the extension

use axum::http::StatusCode;
use std::fs;
use std::path::{Path, PathBuf};

use crate::http::response::Reply;
use crate::render::ResourceLocator;

const PUBLIC_DIR: &str = "public";
const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";

/// Map a request path to a file under a module's public directory.
pub fn module_asset_path(locator: &ResourceLocator, path: &str) -> Option<PathBuf> {
    if path.contains(['\\', '\0']) {
        return None;
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return None;
    }

    match segments.as_slice() {
        ["module", name, public, rest @ ..] if *public == PUBLIC_DIR && !rest.is_empty() => {
            let public_dir = locator.module_dir(name)?.join(PUBLIC_DIR);
            Some(rest.iter().fold(public_dir, |acc, s| acc.join(s)))
        }
        _ => None,
    }
}

/// Serve a module asset, if the path names a readable file.
pub fn serve(locator: &ResourceLocator, path: &str) -> Option<Reply> {
    let file = module_asset_path(locator, path)?;
    let public_dir = module_public_dir(locator, path)?;

    let resolved = fs::canonicalize(&file).ok()?;
    let root = fs::canonicalize(&public_dir).ok()?;
    if !resolved.starts_with(&root) || !resolved.is_file() {
        tracing::debug!(path, file = %file.display(), "Module asset rejected");
        return None;
    }

    match fs::read(&resolved) {
        Ok(bytes) => {
            let content_type = content_type_for(&resolved, &bytes);
            tracing::debug!(path, content_type = %content_type, "Serving module asset");
            Some(Reply::new(StatusCode::OK, content_type, bytes))
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "Module asset unreadable");
            None
        }
    }
}

fn module_public_dir(locator: &ResourceLocator, path: &str) -> Option<PathBuf> {
    let name = path.split('/').nth(1)?;
    locator.module_dir(name).map(|dir| dir.join(PUBLIC_DIR))
}

/// Pick a content type from the file's bytes, then its extension.
pub fn content_type_for(path: &Path, bytes: &[u8]) -> String {
    let sniffed = sniff(bytes);
    if sniffed != TEXT_PLAIN && sniffed != OCTET_STREAM {
        return sniffed.to_string();
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    // Stylesheets and scripts sniff as plain text, and browsers refuse them
    // under `text/plain` when `nosniff` is set.
    match extension.as_deref() {
        Some("css") => "text/css".to_string(),
        Some("js") => "application/javascript".to_string(),
        _ => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(sniffed)
            .to_string(),
    }
}

/// Content sniffing by magic number, falling back to text or binary.
pub fn sniff(bytes: &[u8]) -> &'static str {
    const MAGIC: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"%PDF-", "application/pdf"),
        (b"wOF2", "font/woff2"),
        (b"wOFF", "font/woff"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
    ];

    if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return *mime;
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }
    if !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok() {
        TEXT_PLAIN
    } else {
        OCTET_STREAM
    }
}
