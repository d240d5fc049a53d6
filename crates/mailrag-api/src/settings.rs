//! Start-up configuration resolution.
//!
//! Layers, lowest to highest precedence: built-in defaults, the optional
//! TOML file, then flags and environment variables. The result is resolved
//! once and handed to each component; nothing below this layer reads the
//! environment.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use mailrag_infra::config::load_config;
use mailrag_types::config::{AppConfig, OnError, StoreBackend};
use mailrag_types::error::ConfigError;

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Values supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub database_url: Option<String>,
    pub store_backend: Option<StoreBackend>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub web_dir: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub on_error: Option<OnError>,
}

/// Fully resolved configuration plus the API credential.
pub struct Settings {
    pub config: AppConfig,
    api_key: Option<SecretString>,
}

impl Settings {
    /// Load the config file (if any) and apply `overrides` on top.
    pub async fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        let config = load_config(overrides.config_path.as_deref()).await?;
        Ok(Self::from_parts(config, overrides))
    }

    fn from_parts(mut config: AppConfig, overrides: Overrides) -> Self {
        if let Some(base_url) = overrides.openai_base_url {
            config.embedding.base_url = base_url.clone();
            config.completion.base_url = base_url;
        }
        if let Some(database_url) = overrides.database_url {
            config.store.database_url = database_url;
        }
        if let Some(backend) = overrides.store_backend {
            config.store.backend = backend;
        }
        if let Some(host) = overrides.host {
            config.server.host = host;
        }
        if let Some(port) = overrides.port {
            config.server.port = port;
        }
        if let Some(web_dir) = overrides.web_dir {
            config.server.web_dir = Some(web_dir);
        }
        if let Some(data_file) = overrides.data_file {
            config.ingest.data_file = data_file;
        }
        if let Some(on_error) = overrides.on_error {
            config.ingest.on_error = on_error;
        }

        let api_key = overrides
            .api_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        Self { config, api_key }
    }

    /// The API credential, or [`ConfigError::MissingCredential`].
    pub fn require_api_key(&self) -> Result<SecretString, ConfigError> {
        self.api_key
            .as_ref()
            .map(|key| SecretString::from(key.expose_secret().to_string()))
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_defaults_without_file_or_overrides() {
        let settings = Settings::resolve(Overrides::default()).await.unwrap();
        assert_eq!(settings.config, AppConfig::default());
        assert!(matches!(
            settings.require_api_key(),
            Err(ConfigError::MissingCredential("OPENAI_API_KEY"))
        ));
    }

    #[tokio::test]
    async fn test_overrides_beat_file_and_file_beats_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mailrag.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 9100
host = "127.0.0.1"

[store]
database_url = "postgresql://file/db"
"#,
        )
        .await
        .unwrap();

        let overrides = Overrides {
            config_path: Some(path),
            port: Some(9200),
            api_key: Some("sk-from-env".to_string()),
            openai_base_url: Some("http://localhost:4000/v1".to_string()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides).await.unwrap();

        assert_eq!(settings.config.server.port, 9200);
        assert_eq!(settings.config.server.host, "127.0.0.1");
        assert_eq!(settings.config.store.database_url, "postgresql://file/db");
        assert_eq!(settings.config.embedding.base_url, "http://localhost:4000/v1");
        assert_eq!(settings.config.completion.base_url, "http://localhost:4000/v1");
        assert_eq!(settings.config.ingest.data_file, PathBuf::from("data/emails_5000.jsonl"));
        assert_eq!(settings.require_api_key().unwrap().expose_secret(), "sk-from-env");
    }

    #[tokio::test]
    async fn test_missing_config_file_is_error() {
        let overrides = Overrides {
            config_path: Some(PathBuf::from("/nonexistent/mailrag.toml")),
            ..Overrides::default()
        };
        assert!(matches!(
            Settings::resolve(overrides).await,
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let settings = Settings::from_parts(
            AppConfig::default(),
            Overrides {
                api_key: Some("   ".to_string()),
                ..Overrides::default()
            },
        );
        assert!(settings.require_api_key().is_err());
    }
}
