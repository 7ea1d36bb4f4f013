//! Folder → zip archive.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fileio_core::create_temporary_file;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

/// Zip the contents of `folder` into a new temp file and return its path.
///
/// Entry names are relative to `folder` and use `/` separators. Symlinks
/// are followed for files and skipped for directories. The caller owns the
/// returned file.
pub fn zip_folder(folder: impl AsRef<Path>) -> Result<PathBuf, ArchiveError> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(ArchiveError::NotFound {
            path: folder.to_path_buf(),
        });
    }

    let zip_path = create_temporary_file(b"", ".zip")?;
    let count = discard_on_error(&zip_path, write_zip(folder, &zip_path))?;

    info!("Zipped {} entries from {} into {}", count, folder.display(), zip_path.display());
    Ok(zip_path)
}

fn write_zip(folder: &Path, zip_path: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(zip_path).map_err(|e| ArchiveError::io(zip_path, e))?;

    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let count = add_directory(&mut writer, folder, folder, options)?;
    writer.finish()?.flush().map_err(|e| ArchiveError::io(zip_path, e))?;
    Ok(count)
}

/// Remove the half-written archive when `result` is an error.
fn discard_on_error<T>(
    zip_path: &Path,
    result: Result<T, ArchiveError>,
) -> Result<T, ArchiveError> {
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(zip_path) {
            warn!("Could not remove {}: {}", zip_path.display(), e);
        }
    }
    result
}

fn add_directory(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: SimpleFileOptions,
) -> Result<usize, ArchiveError> {
    let mut entries = std::fs::read_dir(dir)
        .and_then(|rd| rd.collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| ArchiveError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut count = 0;
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ArchiveError::io(&path, e))?;
        let name = entry_name(root, &path);

        if file_type.is_dir() {
            writer.add_directory(format!("{name}/"), options)?;
            count += 1 + add_directory(writer, root, &path, options)?;
        } else if path.is_file() {
            writer.start_file(name, options)?;
            let mut source = File::open(&path).map_err(|e| ArchiveError::io(&path, e))?;
            std::io::copy(&mut source, writer).map_err(|e| ArchiveError::io(&path, e))?;
            count += 1;
        } else {
            debug!("Skipping {} (not a regular file)", path.display());
        }
    }
    Ok(count)
}

/// `root/a/b.txt` → `a/b.txt`
fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
