//! Configuration system — YAML/JSON parsing, env var interpolation, and file I/O.
//!
//! # Usage
//! ```no_run
//! use fileio_core::config;
//!
//! let cfg = config::load_config_file("config.yml")?;
//! if let Some(language) = cfg.get("language").and_then(|v| v.as_str()) {
//!     println!("Language: {language}");
//! }
//! # Ok::<(), fileio_core::ConfigError>(())
//! ```

pub mod loader;
pub mod value;
pub mod yaml;

// Re-export key types
pub use loader::{
    load_config_as, load_config_file, load_yaml_file, read_file, read_json_file, write_yaml_file,
};
pub use value::{ConfigMap, ConfigValue, Shape};
pub use yaml::load_yaml_text;
