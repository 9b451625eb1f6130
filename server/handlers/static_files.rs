use std::path::{Path, PathBuf};

use crate::routes::{bytes_response, not_found, HttpResponse};

// ---------------------------------------------------------------------------
// GET /<anything>
// ---------------------------------------------------------------------------

/// Serves a file from the front-end bundle, falling back to `index.html` so
/// client-side routes resolve.
pub fn handle(url_path: &str, static_dir: &Path) -> HttpResponse {
    match resolve(url_path, static_dir) {
        Some(file) => match std::fs::read(&file) {
            Ok(bytes) => bytes_response(200, content_type(&file), bytes),
            Err(e) => {
                log::warn!("cannot read {}: {}", file.display(), e);
                not_found()
            }
        },
        None => not_found(),
    }
}

/// Maps a URL path to an existing file under `static_dir`.
fn resolve(url_path: &str, static_dir: &Path) -> Option<PathBuf> {
    let rel = url_path.trim_start_matches('/');
    // Reject path traversal attempts.
    if rel.contains("..") || rel.contains('\\') {
        return None;
    }
    if !rel.is_empty() {
        let candidate = static_dir.join(rel);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    let index = static_dir.join("index.html");
    index.is_file().then_some(index)
}

fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "js"   => "application/javascript",
        "css"  => "text/css",
        "json" => "application/json",
        "png"  => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg"  => "image/svg+xml",
        "ico"  => "image/x-icon",
        "txt"  => "text/plain; charset=utf-8",
        _      => "application/octet-stream",
    }
}
