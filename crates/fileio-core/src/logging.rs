//! Logging setup on top of `tracing-subscriber`.
//!
//! The default level comes from the caller, then `LOG_LEVEL`, then `INFO`.
//! `RUST_LOG` directives are layered on top for per-module tuning.

use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Environment variable consulted when no explicit level is given.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Level used when neither the caller nor `LOG_LEVEL` set one.
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Resolve a level name (case-insensitive) to a filter.
///
/// Accepts `trace`, `debug`, `info`, `warn`/`warning`, `error`,
/// `critical`/`fatal` (mapped to error) and `off`.
pub fn resolve_log_level(level: Option<&str>) -> Result<LevelFilter, ConfigError> {
    let name = match level {
        Some(level) => level.to_string(),
        None => std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
    };

    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(ConfigError::InvalidLogLevel(name)),
    }
}

/// Install a coloured, timestamped fmt subscriber as the global default.
///
/// If a global subscriber is already installed it is kept and this is a no-op.
pub fn configure_colored_logging(level: Option<&str>) -> Result<(), ConfigError> {
    let level = resolve_log_level(level)?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_target(true)
        .try_init();

    if installed.is_err() {
        debug!("Global tracing subscriber already installed; keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_wins() {
        temp_env::with_var(ENV_LOG_LEVEL, Some("ERROR"), || {
            assert_eq!(resolve_log_level(Some("debug")).unwrap(), LevelFilter::DEBUG);
        });
    }

    #[test]
    fn test_env_level_used() {
        temp_env::with_var(ENV_LOG_LEVEL, Some("WARNING"), || {
            assert_eq!(resolve_log_level(None).unwrap(), LevelFilter::WARN);
        });
    }

    #[test]
    fn test_default_level() {
        temp_env::with_var_unset(ENV_LOG_LEVEL, || {
            assert_eq!(resolve_log_level(None).unwrap(), LevelFilter::INFO);
        });
    }

    #[test]
    fn test_python_style_names() {
        assert_eq!(resolve_log_level(Some("CRITICAL")).unwrap(), LevelFilter::ERROR);
        assert_eq!(resolve_log_level(Some(" Trace ")).unwrap(), LevelFilter::TRACE);
        assert_eq!(resolve_log_level(Some("off")).unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let err = resolve_log_level(Some("verbose")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(ref l) if l == "verbose"));
    }

    #[test]
    fn test_configure_twice_is_ok() {
        configure_colored_logging(Some("debug")).unwrap();
        configure_colored_logging(Some("info")).unwrap();
        assert!(configure_colored_logging(Some("nope")).is_err());
    }
}
