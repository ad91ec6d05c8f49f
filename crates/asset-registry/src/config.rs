//! Configuration management for the Asset Registry
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string (`redis://...` or `memory://`)
    pub store_url: String,

    /// Database name; namespaces every stored key
    pub db_name: String,

    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            db_name: env::var("DB_NAME").unwrap_or_else(|_| "assets".to_string()),

            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid API_PORT")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.db_name.is_empty() {
            anyhow::bail!("DB_NAME must not be empty");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
