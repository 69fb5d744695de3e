//! Request path validation for static assets.
//!
//! Guards the frontend directory against traversal: only plain relative
//! paths that stay inside the bundle are accepted.

use crate::error::{LesionError, Result};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Maximum allowed path length.
pub const MAX_PATH_LENGTH: usize = 1024;

/// Maximum allowed filename length.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum directory depth below the bundle root.
pub const MAX_DEPTH: usize = 16;

/// Validate a relative asset path taken from a URL.
///
/// Rejects absolute paths, `..` components, null bytes, control characters
/// and dotfiles. Returns the path with `.` components removed.
pub fn validate_asset_path(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(invalid("Path is empty"));
    }

    if path.len() > MAX_PATH_LENGTH {
        return Err(invalid(&format!(
            "Path exceeds maximum length of {} bytes",
            MAX_PATH_LENGTH
        )));
    }

    if path.contains('\0') {
        warn!(path_len = path.len(), "Asset path contains null byte");
        return Err(invalid("Path contains null byte"));
    }

    // Treat both separators alike regardless of platform.
    if path.contains('\\') {
        return Err(invalid("Path contains backslash"));
    }

    let mut normalized = PathBuf::new();
    let mut depth = 0;

    for component in Path::new(path).components() {
        match component {
            Component::Normal(name) => {
                let name_str = name.to_string_lossy();

                if name_str.len() > MAX_FILENAME_LENGTH {
                    return Err(invalid(&format!(
                        "Filename exceeds maximum length of {} bytes",
                        MAX_FILENAME_LENGTH
                    )));
                }

                if name_str.chars().any(|c| c.is_control()) {
                    return Err(invalid("Filename contains control characters"));
                }

                if name_str.starts_with('.') {
                    return Err(invalid("Hidden files are not served"));
                }

                normalized.push(name);
                depth += 1;

                if depth > MAX_DEPTH {
                    return Err(invalid(&format!(
                        "Path depth exceeds maximum of {}",
                        MAX_DEPTH
                    )));
                }
            }
            Component::ParentDir => {
                warn!(path = %path, "Path traversal attempt detected");
                return Err(invalid("Parent directory traversal not allowed"));
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("Absolute paths not allowed"));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(invalid("Path is empty"));
    }

    Ok(normalized)
}

/// Normalize a path by resolving `.` and `..` lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            _ => {
                normalized.push(component);
            }
        }
    }

    normalized
}

/// Check if a path is within a base directory (without filesystem access).
pub fn is_within_base(path: &Path, base: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(base))
}

fn invalid(reason: &str) -> LesionError {
    LesionError::BadRequest(format!("Invalid asset path: {}", reason))
}
