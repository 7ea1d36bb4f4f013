//! Archive extraction — tar (plain or gzip) with a zip fallback.
//!
//! Entries whose paths would land outside the target directory are rejected
//! by both readers.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};
use zip::result::ZipError;

use crate::error::ArchiveError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Unpack `bytes` into `directory` and return the directory.
///
/// Tries tar first (gzip-compressed when the buffer starts with the gzip
/// magic), then zip. The directory is created if it does not exist, and
/// removed again when it was created here and the buffer is not an archive.
pub fn unarchive(bytes: &[u8], directory: impl AsRef<Path>) -> Result<PathBuf, ArchiveError> {
    let directory = directory.as_ref();
    let created = !directory.exists();
    std::fs::create_dir_all(directory).map_err(|e| ArchiveError::io(directory, e))?;

    let tar_result = if bytes.starts_with(&GZIP_MAGIC) {
        extract_tar(GzDecoder::new(bytes), directory)
    } else {
        extract_tar(bytes, directory)
    };

    let tar_err = match tar_result {
        Ok(count) => {
            info!("Extracted {} tar entries into {}", count, directory.display());
            return Ok(directory.to_path_buf());
        }
        Err(e) => e,
    };
    debug!(error = %tar_err, "Not a tar archive, trying zip");

    match extract_zip(bytes, directory) {
        Ok(count) => {
            info!("Extracted {} zip entries into {}", count, directory.display());
            Ok(directory.to_path_buf())
        }
        Err(zip_err) => {
            if created {
                // Only succeeds while the directory is still empty.
                let _ = std::fs::remove_dir(directory);
            }
            Err(ArchiveError::UnsupportedArchive {
                tar: tar_err.to_string(),
                zip: zip_err.to_string(),
            })
        }
    }
}

/// Unpack a tar stream; an archive without entries counts as a failure.
fn extract_tar<R: Read>(reader: R, directory: &Path) -> std::io::Result<usize> {
    let mut archive = tar::Archive::new(reader);
    let mut count = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.unpack_in(directory)? {
            return Err(escaping_entry(&entry.path()?));
        }
        count += 1;
    }

    if count == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "no tar entries found",
        ));
    }
    Ok(count)
}

/// Unpack a zip buffer.
fn extract_zip(bytes: &[u8], directory: &Path) -> Result<usize, ZipError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            return Err(escaping_entry(Path::new(file.name())).into());
        };
        let out_path = directory.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = std::fs::File::create(&out_path)?;
            std::io::copy(&mut file, &mut out)?;
        }
    }
    Ok(archive.len())
}

fn escaping_entry(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("entry escapes target directory: {}", path.display()),
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unarchive_tar() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = tar_bytes(&[("config.yml", "language: en\n"), ("data/nlu.md", "## intent")]);

        let out = unarchive(&bytes, dir.path()).unwrap();
        assert_eq!(out, dir.path());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("config.yml")).unwrap(),
            "language: en\n"
        );
        assert!(dir.path().join("data").join("nlu.md").is_file());
    }

    #[test]
    fn test_unarchive_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let raw = tar_bytes(&[("domain.yml", "intents: []\n")]);
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw).unwrap();
        let bytes = encoder.finish().unwrap();

        unarchive(&bytes, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("domain.yml")).unwrap(),
            "intents: []\n"
        );
    }

    #[test]
    fn test_unarchive_falls_back_to_zip() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_bytes(&[("models/fingerprint.json", "{}"), ("README", "hi")]);

        unarchive(&bytes, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("models").join("fingerprint.json")).unwrap(),
            "{}"
        );
        assert!(dir.path().join("README").is_file());
    }

    #[test]
    fn test_unarchive_creates_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");
        let bytes = zip_bytes(&[("a.txt", "a")]);

        unarchive(&bytes, &target).unwrap();
        assert!(target.join("a.txt").is_file());
    }

    #[test]
    fn test_unarchive_garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let err = unarchive(b"definitely not an archive", dir.path()).unwrap_err();
        assert!(
            matches!(err, ArchiveError::UnsupportedArchive { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_unsupported_archive_leaves_no_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");

        let err = unarchive(b"definitely not an archive", &target).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedArchive { .. }));
        assert!(!target.exists());

        // A directory that was already there is left alone.
        assert!(unarchive(b"still not an archive", dir.path()).is_err());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_unarchive_empty_buffer_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let err = unarchive(&[], dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedArchive { .. }));
    }

    #[test]
    fn test_zip_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        let bytes = zip_bytes(&[("../escape.txt", "x")]);

        let err = unarchive(&bytes, &target).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedArchive { .. }));
        assert!(!dir.path().join("escape.txt").exists());
    }
}
