//! fileio core — config loading, YAML/JSON helpers, paths, and logging.
//!
//! This crate contains:
//! - **config**: `${NAME}`-interpolating YAML loader, JSON reader, YAML writer
//! - **paths**: subdirectory checks, parent directory creation, temp files
//! - **logging**: `tracing-subscriber` setup driven by `LOG_LEVEL`
//! - **error**: the shared [`ConfigError`]

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::{
    load_config_as, load_config_file, load_yaml_file, load_yaml_text, read_file, read_json_file,
    write_yaml_file, ConfigMap, ConfigValue, Shape,
};
pub use error::ConfigError;
pub use logging::configure_colored_logging;
pub use paths::{create_parent_directories, create_temporary_file, is_subdirectory};
