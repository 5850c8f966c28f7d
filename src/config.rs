use crate::error::{AppError, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiServerConfig,
    /// Item store configuration
    pub store: StoreConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// WebSocket configuration
    pub realtime: RealtimeConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port for the API server (default: 5000)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Allowed CORS origins (comma-separated, empty = any origin)
    pub cors_origins: Vec<String>,
}

/// Which item store backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }

}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(AppError::InvalidConfig(format!(
                "STORE_BACKEND must be postgres or memory, got {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store backend (postgres, memory)
    pub backend: StoreBackend,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL, overrides the individual parts when set
    pub url: Option<String>,
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Database name
    pub name: String,
    /// SSL mode (disable, require, prefer)
    pub ssl_mode: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Minimum connections in pool
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Seconds between liveness sweeps (default: 30)
    pub heartbeat_interval_secs: u64,
    /// Outbound messages buffered per connection
    pub buffer_size: usize,
}

impl RealtimeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let backend: StoreBackend = get_env_or("STORE_BACKEND", "postgres").parse()?;

        let heartbeat_interval_secs: u64 = get_env_or("WS_HEARTBEAT_INTERVAL_SECS", "30")
            .parse()
            .map_err(|_| {
                AppError::InvalidConfig("WS_HEARTBEAT_INTERVAL_SECS must be a valid number".into())
            })?;
        if heartbeat_interval_secs == 0 {
            return Err(AppError::InvalidConfig(
                "WS_HEARTBEAT_INTERVAL_SECS must be at least 1".into(),
            ));
        }

        let buffer_size: usize = get_env_or("WS_BUFFER_SIZE", "256").parse().map_err(|_| {
            AppError::InvalidConfig("WS_BUFFER_SIZE must be a valid number".into())
        })?;
        if buffer_size == 0 {
            return Err(AppError::InvalidConfig(
                "WS_BUFFER_SIZE must be at least 1".into(),
            ));
        }

        Ok(Config {
            api: ApiServerConfig {
                port: get_env_or("PORT", "5000").parse().map_err(|_| {
                    AppError::InvalidConfig("PORT must be a valid port number".into())
                })?,
                host: get_env_or("HOST", "0.0.0.0"),
                cors_origins: get_env_or("CORS_ORIGINS", "")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            store: StoreConfig { backend },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                host: get_env_or("DB_HOST", "localhost"),
                port: get_env_or("DB_PORT", "5432").parse().map_err(|_| {
                    AppError::InvalidConfig("DB_PORT must be a valid port number".into())
                })?,
                user: get_env_or("DB_USER", "itemcast"),
                password: get_env_or("DB_PASSWORD", "itemcast"),
                name: get_env_or("DB_NAME", "itemcast"),
                ssl_mode: get_env_or("DB_SSLMODE", "disable"),
                max_connections: get_env_or("DB_MAX_CONNECTIONS", "10")
                    .parse()
                    .map_err(|_| {
                        AppError::InvalidConfig("DB_MAX_CONNECTIONS must be a valid number".into())
                    })?,
                min_connections: get_env_or("DB_MIN_CONNECTIONS", "1").parse().map_err(|_| {
                    AppError::InvalidConfig("DB_MIN_CONNECTIONS must be a valid number".into())
                })?,
            },
            realtime: RealtimeConfig {
                heartbeat_interval_secs,
                buffer_size,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the database connection URL
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }

        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.name,
            self.database.ssl_mode
        )
    }

    /// Get the API server address
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
