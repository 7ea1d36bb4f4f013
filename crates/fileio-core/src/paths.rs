//! Path helpers — subdirectory checks, parent creation, persisted temp files.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

/// Make `path` absolute against the current directory and drop `.`/`..`
/// lexically. Symlinks are not resolved and the path need not exist.
pub fn absolute(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`
                if !matches!(out.components().next_back(), Some(Component::RootDir) | None) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` is `candidate_parent` or lies beneath it.
///
/// Compares whole path components, so `/foo/barbaz` is not inside `/foo/bar`.
pub fn is_subdirectory(path: impl AsRef<Path>, candidate_parent: impl AsRef<Path>) -> bool {
    match (absolute(path), absolute(candidate_parent)) {
        (Ok(path), Ok(parent)) => path.starts_with(parent),
        _ => false,
    }
}

/// Ensure every directory above `path` exists. Succeeds if they already do.
pub fn create_parent_directories(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let abs = absolute(path).map_err(|e| ConfigError::from_io(path, e))?;
    let Some(parent) = abs.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|e| ConfigError::from_io(parent, e))?;
    Ok(())
}

/// Write `data` to a new temp file ending in `suffix` and keep it on disk.
///
/// The caller owns the returned path and is responsible for removing it.
pub fn create_temporary_file(
    data: impl AsRef<[u8]>,
    suffix: &str,
) -> Result<PathBuf, ConfigError> {
    let temp_dir = std::env::temp_dir();
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .map_err(|e| ConfigError::from_io(&temp_dir, e))?;

    file.write_all(data.as_ref())
        .and_then(|()| file.flush())
        .map_err(|e| ConfigError::from_io(file.path(), e))?;

    let (_, path) = file.keep().map_err(|e| ConfigError::from_io(&temp_dir, e.error))?;
    debug!("Created temporary file {}", path.display());
    Ok(path)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
