//! Configuration module for Warden Core.
//!
//! Loads configuration from YAML files and environment variables.

use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::UserRecord;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Deadline for a single verification, in milliseconds.
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub local: LocalConfig,
    /// Users served by the built-in store.
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// Token strategy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret. Required by the `jwt` strategy.
    #[serde(default)]
    pub secret: String,
    /// Required issuer, if set.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Header carrying the token (defaults to `Authorization`).
    #[serde(default)]
    pub header: Option<String>,
    /// Clock skew tolerance for `exp`.
    #[serde(default)]
    pub leeway_secs: u64,
}

/// Password strategy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_username_field")]
    pub username_field: String,
    #[serde(default = "default_password_field")]
    pub password_field: String,
}

fn default_verify_timeout_ms() -> u64 {
    5000
}

fn default_username_field() -> String {
    "email".to_string()
}

fn default_password_field() -> String {
    "password".to_string()
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (WARDEN__*, e.g. `WARDEN__AUTH__JWT__SECRET`)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with WARDEN__ prefix
            .add_source(
                Environment::with_prefix("WARDEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject values the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Message("server.host must be set".to_string()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port must be set".to_string()));
        }
        if self.auth.verify_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "auth.verify_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            verify_timeout_ms: default_verify_timeout_ms(),
            jwt: JwtConfig::default(),
            local: LocalConfig::default(),
            users: Vec::new(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            username_field: default_username_field(),
            password_field: default_password_field(),
        }
    }
}
