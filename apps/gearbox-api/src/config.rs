//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use gearbox_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// Interface to bind
    pub bind: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,

    /// Allow any origin (the frontend dev server runs on another port)
    pub cors_permissive: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 5000,
            bind: "0.0.0.0".to_string(),
            database_path: PathBuf::from("./gearbox.db"),
            db_max_connections: 5,
            run_migrations: true,
            cors_permissive: true,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            port: parse_var(&lookup, "GEARBOX_PORT", defaults.port)?,

            bind: lookup("GEARBOX_BIND").unwrap_or(defaults.bind),

            database_path: lookup("GEARBOX_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_var(
                &lookup,
                "GEARBOX_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            run_migrations: parse_var(&lookup, "GEARBOX_RUN_MIGRATIONS", defaults.run_migrations)?,

            cors_permissive: parse_var(
                &lookup,
                "GEARBOX_CORS_PERMISSIVE",
                defaults.cors_permissive,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "GEARBOX_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// `bind:port`, ready for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.db_max_connections)
            .run_migrations(self.run_migrations)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
