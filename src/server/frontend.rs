//! Prebuilt frontend bundle served from disk.

use super::validation::{is_within_base, validate_asset_path};
use crate::error::{LesionError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entry page of the bundle.
pub const INDEX_FILE: &str = "index.html";

/// A static asset ready to send.
#[derive(Debug, Clone)]
pub struct Asset {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Read-only view of the frontend directory.
#[derive(Debug, Clone)]
pub struct FrontendAssets {
    root: PathBuf,
}

impl FrontendAssets {
    /// Serve files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bundle directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the bundle has an entry page.
    pub fn has_index(&self) -> bool {
        self.root.join(INDEX_FILE).is_file()
    }

    /// Map a URL path onto a file inside the bundle.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let relative = validate_asset_path(relative).map_err(|e| {
            debug!(error = %e, "Rejected asset path");
            not_found(relative)
        })?;

        let path = self.root.join(&relative);
        if !is_within_base(&path, &self.root) {
            return Err(not_found(&relative.to_string_lossy()));
        }
        Ok(path)
    }

    /// Load an asset.
    pub async fn load(&self, relative: &str) -> Result<Asset> {
        let path = self.resolve(relative)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(not_found(relative))
            }
            // Directories read as an error on every platform
            Err(_) if path.is_dir() => return Err(not_found(relative)),
            Err(e) => return Err(e.into()),
        };

        Ok(Asset {
            content_type: content_type_for(&path),
            bytes,
        })
    }

    /// Load the entry page.
    pub async fn index(&self) -> Result<Asset> {
        self.load(INDEX_FILE).await
    }
}

fn not_found(path: &str) -> LesionError {
    LesionError::NotFound(path.to_string())
}

/// Content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
