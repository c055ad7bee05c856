use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod env_vars;
pub mod models;

pub use models::*;

/// Loads the layered configuration for the current `RUN_ENV`.
///
/// Sources, later ones winning:
/// 1. `config/default.{toml,json,yaml}`
/// 2. `config/<RUN_ENV>.{toml,json,yaml}`
/// 3. `CLUBHOUSE__SECTION__KEY` environment variables
/// 4. legacy variables such as `API_BASE_URL` (only when 3 is absent)
///
/// The config directory defaults to `./config` and can be moved with
/// `CLUBHOUSE_CONFIG_DIR`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let config_dir = env::var("CLUBHOUSE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    load_config_from(&config_dir, &run_env)
}

/// Loads configuration from an explicit directory and run environment.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let default_path = config_dir.join("default");
    let env_path = config_dir.join(run_env);
    let prefix = env_vars::get_config_prefix();

    debug!(
        "loading config: default={}, env={}, prefix={}",
        default_path.display(),
        env_path.display(),
        prefix
    );

    let mut builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator(env_vars::CONFIG_SEPARATOR)
                .separator(env_vars::CONFIG_SEPARATOR)
                .try_parsing(true),
        );

    for path in env_vars::LEGACY_OVERRIDABLE_PATHS {
        builder = builder.set_override_option(*path, env_vars::get_config_env_var(path))?;
    }

    builder.build()?.try_deserialize()
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file is `DOTENV_OVERRIDE` when set, else the first command line
/// argument if it names a `.env*` file, else `.env`. Loading happens once per
/// process; a missing file is not an error.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
