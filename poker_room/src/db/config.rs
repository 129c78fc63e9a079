//! Database configuration module.

use std::env;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,

    /// Apply bundled migrations after connecting
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 20)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 2)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    /// - `DB_RUN_MIGRATIONS`: Migrate on startup (default: true)
    ///
    /// # Errors
    ///
    /// Returns the offending variable name if `DATABASE_URL` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::development();
        Ok(Self {
            database_url: env::var("DATABASE_URL").map_err(|_| "DATABASE_URL".to_string())?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: parse_var(
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_var("DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
            run_migrations: parse_var("DB_RUN_MIGRATIONS", defaults.run_migrations)?,
        })
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/poker_room` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/poker_room".to_string(),
            max_connections: 20,
            min_connections: 2,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            run_migrations: true,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("database_url cannot be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be positive".to_string());
        }
        if self.min_connections > self.max_connections {
            return Err("min_connections cannot exceed max_connections".to_string());
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, default: T) -> Result<T, String> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| var.to_string()),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_config_is_valid() {
        assert!(DatabaseConfig::development().validate().is_ok());
    }

    #[test]
    fn inverted_pool_bounds_are_rejected() {
        let config = DatabaseConfig {
            min_connections: 30,
            ..DatabaseConfig::development()
        };
        assert!(config.validate().is_err());
    }
}
