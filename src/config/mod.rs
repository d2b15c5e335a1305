use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Upper bound on one page of collection history.
    pub max_history_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Shared secret the identity gateway uses to sign forwarded agent
    /// headers.
    pub identity_signing_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                max_history_page_size: env::var("MAX_HISTORY_PAGE_SIZE")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid MAX_HISTORY_PAGE_SIZE".to_string())
                    })?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            security: SecurityConfig {
                identity_signing_secret: env::var("IDENTITY_SIGNING_SECRET").map_err(|_| {
                    AppError::Configuration("IDENTITY_SIGNING_SECRET not set".to_string())
                })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.app.max_history_page_size == 0 {
            return Err(AppError::Configuration(
                "History page size must be greater than 0".to_string(),
            ));
        }

        if self.security.identity_signing_secret.len() < 16 {
            return Err(AppError::Configuration(
                "IDENTITY_SIGNING_SECRET must be at least 16 characters".to_string(),
            ));
        }

        Ok(())
    }
}
