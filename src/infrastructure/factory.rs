//! Repository factory for runtime backend selection.
//!
//! This module reads storage configuration from the environment and builds
//! the matching [`TaskRepository`] implementation.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL
//! - `DB_HOST`, `DB_PORT`, `DB_USERNAME`, `DB_PASSWORD`, `DB_DATABASE`:
//!   discrete connection settings used when `DATABASE_URL` is not set
//! - `DB_MAX_CONNECTIONS`: connection pool size (default: 5)
//!
//! # Example
//!
//! ```ignore
//! use infrastructure::factory::{RepositoryConfig, RepositoryFactory};
//!
//! let config = RepositoryConfig::from_env()?;
//! let task_repository = RepositoryFactory::new(config).create().await?;
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use super::{InMemoryTaskRepository, PostgresTaskRepository, TaskRepository};

/// Default size of the `PostgreSQL` connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_DATABASE_PORT: u16 = 5432;

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for task records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local storage. Data is lost on restart.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Discrete `PostgreSQL` connection settings.
///
/// Values are handed to the driver field by field, so credentials may
/// contain any character.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseParts {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl fmt::Debug for DatabaseParts {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabaseParts")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .finish()
    }
}

/// Where the `PostgreSQL` database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// A full `postgres://` connection URL.
    Url(String),
    /// Settings assembled from the `DB_*` variables.
    Parts(DatabaseParts),
}

impl DatabaseTarget {
    /// Builds driver connection options for the target.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidDatabaseUrl` if a URL target
    /// cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigurationError> {
        match self {
            Self::Url(url) => PgConnectOptions::from_str(url)
                .map_err(|error| ConfigurationError::InvalidDatabaseUrl(error.to_string())),
            Self::Parts(parts) => {
                let mut options = PgConnectOptions::new()
                    .host(&parts.host)
                    .port(parts.port)
                    .database(&parts.database);
                if let Some(username) = &parts.username {
                    options = options.username(username);
                }
                if let Some(password) = &parts.password {
                    options = options.password(password);
                }
                Ok(options)
            }
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Where task records are stored.
    pub storage_mode: StorageMode,
    /// `PostgreSQL` location (required when `storage_mode` is `Postgres`).
    pub database: Option<DatabaseTarget>,
    /// Maximum number of pooled `PostgreSQL` connections.
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE`, `DB_MAX_CONNECTIONS`, `DB_PORT` or `DATABASE_URL`
    ///   contains an invalid value
    /// - no database location is given when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable source.
    ///
    /// Empty and whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`RepositoryConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_mode: StorageMode = read("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();

        let max_connections = match read("DB_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(count) if count > 0 => count,
                _ => return Err(ConfigurationError::InvalidMaxConnections(value)),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let database = match read("DATABASE_URL") {
            Some(url) => Some(DatabaseTarget::Url(url)),
            None => database_parts(&read)?.map(DatabaseTarget::Parts),
        };

        let config = Self {
            storage_mode,
            database,
            max_connections,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if `PostgreSQL`
    /// storage is selected without a location, or
    /// `ConfigurationError::InvalidDatabaseUrl` if the URL does not parse.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match (&self.storage_mode, &self.database) {
            (StorageMode::Postgres, None) => Err(ConfigurationError::MissingDatabaseUrl),
            (_, Some(target)) => target.connect_options().map(|_| ()),
            (StorageMode::InMemory, None) => Ok(()),
        }
    }
}

/// Reads the discrete `DB_*` settings.
///
/// Returns `Ok(None)` when neither `DB_HOST` nor `DB_DATABASE` is set.
fn database_parts<F>(read: &F) -> Result<Option<DatabaseParts>, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let (Some(host), Some(database)) = (read("DB_HOST"), read("DB_DATABASE")) else {
        return Ok(None);
    };

    let port = match read("DB_PORT") {
        Some(value) => value
            .parse::<u16>()
            .map_err(|_| ConfigurationError::InvalidDatabasePort(value))?,
        None => DEFAULT_DATABASE_PORT,
    };

    Ok(Some(DatabaseParts {
        host,
        port,
        username: read("DB_USERNAME"),
        password: read("DB_PASSWORD"),
        database,
    }))
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/tasks")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database: Option<DatabaseTarget>,
    max_connections: Option<u32>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database = Some(DatabaseTarget::Url(url.into()));
        self
    }

    /// Sets discrete `PostgreSQL` connection settings.
    #[must_use]
    pub fn database_parts(mut self, parts: DatabaseParts) -> Self {
        self.database = Some(DatabaseTarget::Parts(parts));
        self
    }

    /// Sets the connection pool size.
    #[must_use]
    pub const fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = Some(count);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database: self.database,
            max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors in the storage configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Invalid pool size.
    #[error("Invalid DB_MAX_CONNECTIONS: '{0}'. Expected a positive integer")]
    InvalidMaxConnections(String),

    /// Invalid database port.
    #[error("Invalid DB_PORT: '{0}'. Expected a port number")]
    InvalidDatabasePort(String),

    /// `DATABASE_URL` could not be parsed.
    #[error("Invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(String),

    /// No database location when storage mode is Postgres.
    #[error(
        "DATABASE_URL (or DB_HOST and DB_DATABASE) is required when STORAGE_MODE=postgres"
    )]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory for creating the task repository selected by configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates the task repository.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database connection fails when the
    /// storage mode is `Postgres`.
    pub async fn create(&self) -> Result<Arc<dyn TaskRepository>, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Arc::new(InMemoryTaskRepository::new())),
            StorageMode::Postgres => {
                let options = self
                    .config
                    .database
                    .as_ref()
                    .ok_or(ConfigurationError::MissingDatabaseUrl)?
                    .connect_options()?;

                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .connect_with(options)
                    .await
                    .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;

                Ok(Arc::new(PostgresTaskRepository::new(pool)))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
