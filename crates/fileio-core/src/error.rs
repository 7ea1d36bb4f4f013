//! Error type shared by every loader, writer and path helper in this crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::value::Shape;

/// Failures surfaced by config loading, YAML/JSON parsing and path helpers.
///
/// Every variant carries enough context (path, offending token, or position)
/// for the caller to act on it without re-reading the input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file to read does not exist.
    #[error("File '{}' does not exist.", .path.display())]
    NotFound { path: PathBuf },

    /// A config file parsed fine but its top level is not a key/value mapping.
    #[error(
        "Tried to load invalid config file '{}'. Expected a key value mapping but found a {found}.",
        .path.display()
    )]
    InvalidShape { path: PathBuf, found: Shape },

    /// `${NAME}` placeholders that are not set in the process environment.
    #[error(
        "Error when trying to expand the environment variables in '{value}'. \
         Please make sure to also set these environment variables: {names:?}."
    )]
    UnresolvedVariable { value: String, names: Vec<String> },

    /// Structural YAML error (not eligible for recovery).
    #[error("YAML syntax error{}: {message}", position(.line, .column))]
    SyntaxError {
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// YAML tokenization error that survived the re-encoding retry.
    #[error("YAML scanner error{}: {message}", position(.line, .column))]
    ScanError {
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// Failed to read or write a file for a reason other than "not found".
    #[error("I/O error on '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON file content could not be parsed.
    #[error("Failed to read json from '{}'. Error: {message}", .path.display())]
    InvalidJson { path: PathBuf, message: String },

    /// A mapping loaded fine but did not match the requested typed schema.
    #[error("Config file '{}' does not match the expected schema: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    /// Unknown log level name.
    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warning, error, critical, off")]
    InvalidLogLevel(String),
}

impl ConfigError {
    /// Wrap an `std::io::Error`, mapping `NotFound` to [`ConfigError::NotFound`].
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound { path }
        } else {
            ConfigError::IoError { path, source }
        }
    }
}

fn position(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {l} column {c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}
