//! Configuration management for the server.

use std::env;

/// Default and ceiling for `limit` on sync requests.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 500;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Page size used when a client asks for none, or for more than this
    pub max_page_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let max_page_size = match env::var("MAX_PAGE_SIZE") {
            Ok(value) => parse_page_size(&value)?,
            Err(_) => DEFAULT_MAX_PAGE_SIZE,
        };

        Ok(Self {
            host,
            port,
            database_url,
            max_page_size,
        })
    }
}

fn parse_page_size(value: &str) -> Result<usize, ConfigError> {
    match value.parse() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidMaxPageSize(value.to_string())),
        Ok(size) => Ok(size),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid MAX_PAGE_SIZE value \"{0}\": must be a positive integer")]
    InvalidMaxPageSize(String),
}
