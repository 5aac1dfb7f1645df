use cape_domain::constants::{DB_URI_ENV, ENV_PREFIX};
use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Custom error type for config loading.
#[cape_derive::cape_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads configuration from an optional file overlaid with the process environment.
///
/// Layers, lowest precedence first:
/// 1. **Base File**: `path` (default `"server"`, any extension the `config` crate knows,
///    e.g. `server.toml`). A missing file is not an error; built-in defaults apply.
/// 2. **Environment Overrides**: variables prefixed with `CAPE__`, nested with double
///    underscores (`CAPE__DATABASE__URL` maps to `database.url`).
/// 3. **`DB_URI`**: when set, replaces `database.url`.
///
/// # Errors
/// Returns [`ConfigError`] if a source is malformed or does not match `T`.
///
/// # Example
/// ```rust
/// use cape_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_config_with_env(path, std::env::vars().collect())
}

/// Same as [`load_config`] but reads overrides from `vars` instead of the process environment.
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    vars: Map<String, String>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("server"), |p| p.as_ref().to_path_buf());
    let db_uri = vars.get(DB_URI_ENV).filter(|uri| !uri.trim().is_empty()).cloned();

    info!("Loading config from {}", effective_path.display());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        );

    if db_uri.is_some() {
        debug!("{DB_URI_ENV} overrides database.url");
    }

    let config = builder
        .set_override_option("database.url", db_uri)
        .context("Applying DB_URI override")?
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cape_domain::config::ApiConfig;
    use std::fs;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let cfg: ApiConfig =
            load_config_with_env(Some(dir.path().join("absent")), vars(&[])).expect("defaults");

        assert_eq!(cfg.server.port, 5555);
        assert_eq!(cfg.database.url, "sqlite::memory:");
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("server.toml");
        fs::write(&file, "[server]\nport = 7000\n\n[database]\nseed = true\n").expect("write");

        let cfg: ApiConfig = load_config_with_env(
            Some(&file),
            vars(&[("CAPE__SERVER__PORT", "8080"), ("CAPE__HEROES__MAX_DEPTH", "3")]),
        )
        .expect("config");

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.heroes.max_depth, 3);
        assert!(cfg.database.seed);
    }

    #[test]
    fn db_uri_wins_over_prefixed_url() {
        let dir = tempfile::tempdir().expect("tempdir");

        let cfg: ApiConfig = load_config_with_env(
            Some(dir.path().join("absent")),
            vars(&[("CAPE__DATABASE__URL", "sqlite://a.db"), ("DB_URI", "sqlite://b.db")]),
        )
        .expect("config");

        assert_eq!(cfg.database.url, "sqlite://b.db");
    }

    #[test]
    fn malformed_values_are_reported() {
        let dir = tempfile::tempdir().expect("tempdir");

        let err = load_config_with_env::<ApiConfig>(
            Some(dir.path().join("absent")),
            vars(&[("CAPE__SERVER__PORT", "not-a-port")]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Failed to deserialize config"));
    }
}
