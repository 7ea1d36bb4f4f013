use std::path::PathBuf;

use fileio_core::ConfigError;
use thiserror::Error;

/// Failures from archive extraction and creation.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The buffer is neither a readable tar nor a readable zip archive.
    #[error("Unsupported archive: tar failed ({tar}); zip failed ({zip})")]
    UnsupportedArchive { tar: String, zip: String },

    /// The folder to archive does not exist or is not a directory.
    #[error("Folder '{}' does not exist.", .path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Path(#[from] ConfigError),
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }
}
