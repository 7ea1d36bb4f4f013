//! File-level config operations — read, parse, shape-check, write.
//!
//! # Entry points
//! - [`load_config_file`]: YAML whose top level must be a mapping
//! - [`load_yaml_file`]: YAML of any shape (lists, scalars)
//! - [`load_config_as`]: YAML mapping deserialized into a typed struct
//! - [`read_json_file`]: JSON of any shape
//! - [`write_yaml_file`]: block-style YAML, overwriting the target

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use super::value::{ConfigMap, ConfigValue};
use super::yaml::load_yaml_text;
use crate::error::ConfigError;
use crate::paths::absolute;

/// Read a UTF-8 text file.
///
/// A missing path yields [`ConfigError::NotFound`] naming it.
pub fn read_file(path: impl AsRef<Path>) -> Result<String, ConfigError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| ConfigError::from_io(path, e))
}

/// Load a YAML config file whose top level is a key/value mapping.
///
/// An empty or comment-only file returns an empty map.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<ConfigMap, ConfigError> {
    let path = path.as_ref();
    match load_yaml_file(path)? {
        ConfigValue::Mapping(map) => Ok(map),
        other => Err(ConfigError::InvalidShape {
            path: path.to_path_buf(),
            found: other.shape(),
        }),
    }
}

/// Load a YAML file of any shape.
pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<ConfigValue, ConfigError> {
    let path = path.as_ref();
    debug!("Loading YAML from {}", path.display());
    let content = read_file(path)?;
    load_yaml_text(&content)
}

/// Load a YAML config mapping and deserialize it into `T`.
///
/// Environment variables are expanded before deserialization, so `T`
/// sees the substituted text.
pub fn load_config_as<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let map = load_config_file(path)?;

    let invalid = |e: serde_yaml::Error| ConfigError::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let value = serde_yaml::to_value(&map).map_err(invalid)?;
    serde_yaml::from_value(value).map_err(invalid)
}

/// Read a JSON file into a [`ConfigValue`].
pub fn read_json_file(path: impl AsRef<Path>) -> Result<ConfigValue, ConfigError> {
    let path = path.as_ref();
    let content = read_file(path)?;

    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidJson {
            path: absolute(path).unwrap_or_else(|_| PathBuf::from(path)),
            message: e.to_string(),
        })?;
    Ok(ConfigValue::from(json))
}

/// Write `data` as block-style YAML to `path`, replacing any existing file.
///
/// Parent directories are not created; see
/// [`create_parent_directories`](crate::paths::create_parent_directories).
pub fn write_yaml_file(data: &ConfigMap, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();

    let yaml = serde_yaml::to_string(data).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    std::fs::write(path, yaml).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("YAML written to {}", path.display());
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
