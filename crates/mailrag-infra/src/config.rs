//! Configuration file loader for mailrag.
//!
//! Reads an optional TOML file and deserializes it into [`AppConfig`]. Every
//! field has a serde default, so a partial file only overrides what it names.

use std::path::Path;

use mailrag_types::config::AppConfig;
use mailrag_types::error::ConfigError;

/// Load configuration from `path`, or the built-in defaults when `None`.
///
/// An explicitly named file that does not exist, cannot be read, or does not
/// parse is a [`ConfigError`]; nothing silently falls back to defaults.
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        tracing::debug!("no config file given, using defaults");
        return Ok(AppConfig::default());
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(err) => {
            return Err(ConfigError::FileRead {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };

    let config = toml::from_str::<AppConfig>(&content)
        .map_err(|err| ConfigError::Invalid(format!("{}: {err}", path.display())))?;
    tracing::debug!("loaded configuration from {}", path.display());
    Ok(config)
}
