//! Environment-driven configuration.

use std::env;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3033;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:vetportal.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub identity_base_url: String,
    pub identity_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let identity_base_url = env::var("IDENTITY_BASE_URL")
            .map_err(|_| ConfigError::Missing("IDENTITY_BASE_URL"))?;
        let identity_api_key =
            env::var("IDENTITY_API_KEY").map_err(|_| ConfigError::Missing("IDENTITY_API_KEY"))?;

        Ok(Self {
            port,
            database_url,
            identity_base_url,
            identity_api_key,
        })
    }
}
