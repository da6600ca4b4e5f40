// ABOUTME: Environment variable parsing utilities
// ABOUTME: Typed lookups with validation and defaults for marmot server settings

use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Parse an environment variable with validation.
/// Returns the parsed value if it passes validation, otherwise the default.
/// Logs a warning when the variable is set but unusable.
pub fn parse_env_or_default_with_validation<T, F>(var_name: &str, default: T, validator: F) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(T) -> bool,
{
    let Ok(raw_value) = std::env::var(var_name) else {
        return default;
    };

    match raw_value.trim().parse::<T>() {
        Ok(parsed_value) if validator(parsed_value) => parsed_value,
        Ok(_) => {
            warn!(
                "Environment variable {} has invalid value '{}', using default: {}",
                var_name, raw_value, default
            );
            default
        }
        Err(_) => {
            warn!(
                "Environment variable {} has unparseable value '{}', using default: {}",
                var_name, raw_value, default
            );
            default
        }
    }
}

/// Read a path from the environment, ignoring unset and blank values.
pub fn parse_env_path(var_name: &str) -> Option<PathBuf> {
    std::env::var_os(var_name)
        .filter(|value| !value.to_string_lossy().trim().is_empty())
        .map(PathBuf::from)
}
