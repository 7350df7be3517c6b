//! # configs
//!
//! Layered application settings. Sources, lowest precedence first:
//! built-in defaults, `config/default.toml`, `config/{APP_ENV}.toml`, then
//! `BOARD__SECTION__KEY` environment variables (after `.env` is loaded).

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Minimum length of `auth.session_secret`, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    pub url: Option<SecretString>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub session_secret: SecretString,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Loads `.env`, then every configured source, then validates.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name(&format!("config/{env}")).required(false))
                .add_source(
                    Environment::with_prefix("BOARD")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("auth.secure_cookies", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == StorageBackend::Postgres {
            let url = self.database.url.as_ref().map(|u| u.expose_secret().trim());
            if url.map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "database.url is required for the postgres backend".into(),
                ));
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }
        if self.auth.session_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.session_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_hours must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        for (k, v) in pairs {
            builder = builder.set_override(*k, *v).unwrap();
        }
        Settings::from_builder(builder)
    }

    #[test]
    fn defaults_fill_everything_but_secrets() {
        let s = load(&[("database.backend", "memory"), ("auth.session_secret", SECRET)]).unwrap();
        assert_eq!(s.server.port, 8080);
        assert_eq!(s.database.backend, StorageBackend::Memory);
        assert_eq!(s.auth.session_ttl_hours, 168);
        assert_eq!(s.logging.format, LogFormat::Json);
        assert_eq!(s.server.addr().unwrap().port(), 8080);
    }

    #[test]
    fn postgres_requires_a_url() {
        let err = load(&[("auth.session_secret", SECRET)]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("database.url")));

        let ok = load(&[
            ("auth.session_secret", SECRET),
            ("database.url", "postgres://localhost/board"),
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = load(&[("database.backend", "memory"), ("auth.session_secret", "short")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("session_secret")));
    }

    #[test]
    fn missing_secret_fails_to_load() {
        let err = load(&[("database.backend", "memory")]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let s = load(&[
            ("auth.session_secret", SECRET),
            ("database.url", "postgres://user:hunter2@db/board"),
        ])
        .unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains(SECRET));
    }
}
