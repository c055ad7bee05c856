//! Environment variable naming for the Clubhouse configuration.
//!
//! Layered configuration reads `CLUBHOUSE__SECTION__KEY` variables. A few
//! settings also honour the shorter legacy names the web front-end used
//! (e.g. `API_BASE_URL`), which are resolved here.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "CLUBHOUSE";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator used by the legacy variable names
pub const LEGACY_SEPARATOR: &str = "_";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// # Arguments
///
/// * `path` - The configuration path (e.g., "api.base_url")
///
/// # Returns
///
/// The environment variable name (e.g., "CLUBHOUSE__API__BASE_URL")
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Convert a configuration path to its legacy environment variable name
///
/// # Arguments
///
/// * `path` - The configuration path (e.g., "api.base_url")
///
/// # Returns
///
/// The environment variable name (e.g., "API_BASE_URL")
pub fn legacy_path_to_env_var(path: &str) -> String {
    path.replace('.', LEGACY_SEPARATOR).to_uppercase()
}

/// Get an environment variable for a configuration path
///
/// The prefixed name wins; the legacy name is only consulted when the
/// prefixed variable is absent.
pub fn get_config_env_var(path: &str) -> Option<String> {
    if let Ok(value) = env::var(config_path_to_env_var(path)) {
        return Some(value);
    }
    env::var(legacy_path_to_env_var(path)).ok()
}

/// Paths that may be supplied through their legacy names.
pub const LEGACY_OVERRIDABLE_PATHS: &[&str] = &["api.base_url"];
