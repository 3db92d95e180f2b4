//! Server process configuration.
//!
//! # Environment Variables
//!
//! - `HOST`: bind address (default: `0.0.0.0`)
//! - `PORT`: bind port (default: 3000)
//! - `WORKER_THREADS`: tokio worker thread count, capped at four times the
//!   logical CPU count (default: tokio's own choice)

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const FALLBACK_MAX_WORKER_THREADS: usize = 64;

/// Errors in the server configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerConfigError {
    /// `PORT` is not a port number.
    #[error("Invalid PORT: '{0}'. Expected a port number")]
    InvalidPort(String),

    /// `HOST` and `PORT` do not form a socket address.
    #[error("Invalid server address: '{0}'")]
    InvalidAddress(String),
}

/// Settings for the HTTP listener and the tokio runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub address: SocketAddr,
    /// Requested worker thread count, `None` for the runtime default.
    pub worker_threads: Option<usize>,
    /// Non-fatal problems found while reading the environment.
    pub warnings: Vec<String>,
}

impl ServerConfig {
    /// Reads the server configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ServerConfigError` if `PORT` or the resulting address is invalid.
    pub fn from_env() -> Result<Self, ServerConfigError> {
        let max_threads = std::thread::available_parallelism()
            .map_or(FALLBACK_MAX_WORKER_THREADS, |parallelism| {
                parallelism.get().saturating_mul(4)
            });
        Self::from_lookup(|key| env::var(key).ok(), max_threads)
    }

    /// Reads the server configuration from an arbitrary variable source.
    ///
    /// An unusable `WORKER_THREADS` only produces a warning; the runtime
    /// default is used instead, and oversized values are capped at
    /// `max_threads`.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F, max_threads: usize) -> Result<Self, ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = read("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match read("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ServerConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };

        let candidate = format!("{host}:{port}");
        let address = candidate
            .parse::<SocketAddr>()
            .map_err(|_| ServerConfigError::InvalidAddress(candidate))?;

        let mut warnings = Vec::new();
        let worker_threads = read("WORKER_THREADS").and_then(|value| {
            match value.parse::<usize>() {
                Ok(0) => {
                    warnings.push(
                        "WORKER_THREADS=0 is invalid (must be > 0), using default".to_string(),
                    );
                    None
                }
                Ok(requested) if requested > max_threads => {
                    warnings.push(format!(
                        "WORKER_THREADS={requested} exceeds recommended limit ({max_threads}), capping to {max_threads}"
                    ));
                    Some(max_threads)
                }
                Ok(requested) => Some(requested),
                Err(error) => {
                    warnings.push(format!(
                        "WORKER_THREADS='{value}' is not a valid number ({error}), using default"
                    ));
                    None
                }
            }
        });

        Ok(Self {
            address,
            worker_threads,
            warnings,
        })
    }
}
