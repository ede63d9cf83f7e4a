//! Runtime server configuration
//!
//! ServerConfig is read from environment variables once at startup and is
//! immutable afterwards. `RUST_LOG` is handled by the tracing subscriber in
//! the binary, not here.

use axum::http::HeaderValue;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

pub const BIND_ENV: &str = "ANIMALTREE_BIND";
pub const PORT_ENV: &str = "ANIMALTREE_PORT";
pub const DB_PATH_ENV: &str = "ANIMALTREE_DB_PATH";
pub const CORS_ENV: &str = "CORS_ALLOW_ORIGIN";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_PATH: &str = "database.db";

/// Invalid configuration value
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a valid IP address, got '{value}'")]
    InvalidBindAddress { var: &'static str, value: String },

    #[error("{var} must be a port number between 0 and 65535, got '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must contain valid HTTP origins, got '{value}'")]
    InvalidOrigin { var: &'static str, value: String },
}

/// Runtime configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on (default 127.0.0.1)
    pub bind_address: IpAddr,

    /// Port to listen on (default 5000)
    pub port: u16,

    /// Path to the libsql database file, created on first run
    pub database_path: PathBuf,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(BIND_ENV) {
            config.bind_address =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidBindAddress {
                        var: BIND_ENV,
                        value: value.clone(),
                    })?;
        }

        if let Some(value) = get(PORT_ENV) {
            config.port = value.trim().parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_ENV,
                value: value.clone(),
            })?;
        }

        if let Some(value) = get(DB_PATH_ENV) {
            config.database_path = PathBuf::from(value);
        }

        if let Some(value) = get(CORS_ENV) {
            config.cors_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| origin.parse::<HeaderValue>())
                .collect::<Result<_, _>>()
                .map_err(|_| ConfigError::InvalidOrigin {
                    var: CORS_ENV,
                    value: value.clone(),
                })?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
