//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_room::{db::DatabaseConfig, room::RoomConfig};
use std::{fmt, net::SocketAddr, str::FromStr};

const DEFAULT_BIND: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 6969);

/// Where room and player rows live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub storage: StorageBackend,
    /// Database configuration, present for the postgres backend
    pub database: Option<DatabaseConfig>,
    /// Room tunables
    pub room: RoomConfig,
    /// Prometheus listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `storage_override` - Optional storage backend override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        storage_override: Option<StorageBackend>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_var("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let storage = match storage_override {
            Some(storage) => storage,
            None => parse_env_var("STORAGE_BACKEND")?.unwrap_or(StorageBackend::Postgres),
        };

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => {
                let database_url = database_url_override
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| ConfigError::MissingRequired {
                        var: "DATABASE_URL".to_string(),
                        hint: "Set a postgres:// URL or use STORAGE_BACKEND=memory".to_string(),
                    })?;
                let defaults = DatabaseConfig::development();
                Some(DatabaseConfig {
                    database_url,
                    max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
                    min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
                    connection_timeout_secs: parse_env_or(
                        "DB_CONNECTION_TIMEOUT",
                        defaults.connection_timeout_secs,
                    ),
                    idle_timeout_secs: parse_env_or(
                        "DB_IDLE_TIMEOUT",
                        defaults.idle_timeout_secs,
                    ),
                    max_lifetime_secs: parse_env_or(
                        "DB_MAX_LIFETIME",
                        defaults.max_lifetime_secs,
                    ),
                    run_migrations: parse_env_or("DB_RUN_MIGRATIONS", defaults.run_migrations),
                })
            }
        };

        Ok(ServerConfig {
            bind,
            storage,
            database,
            room: RoomConfig::from_env(),
            metrics_bind: parse_env_var("METRICS_BIND")?,
        })
    }

    /// In-memory configuration for tests and local play
    pub fn memory(bind: SocketAddr) -> Self {
        Self {
            bind,
            storage: StorageBackend::Memory,
            database: None,
            room: RoomConfig::default(),
            metrics_bind: None,
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.room.validate().map_err(|reason| ConfigError::Invalid {
            var: "ROOM_*".to_string(),
            reason,
        })?;

        match (&self.storage, &self.database) {
            (StorageBackend::Postgres, None) => Err(ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "The postgres backend needs a database".to_string(),
            }),
            (StorageBackend::Postgres, Some(database)) => {
                database.validate().map_err(|reason| ConfigError::Invalid {
                    var: "DB_*".to_string(),
                    reason,
                })
            }
            (StorageBackend::Memory, _) => Ok(()),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Optional variable that must parse when present
fn parse_env_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
