//! Service error taxonomy.
//!
//! Persistence failures are classified by the operation that hit them so the
//! request surface only has to map a class to a status code.

use thiserror::Error;

use crate::infrastructure::RepositoryError;

/// Failures reported by [`super::TaskService`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The referenced task does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A create or update could not be persisted.
    #[error("{0}")]
    WriteFailure(String),

    /// A list query could not be answered.
    #[error("{0}")]
    RetrievalFailure(String),
}

impl ServiceError {
    /// Classifies a port error raised while writing.
    ///
    /// `NotFound` passes through; anything else becomes `WriteFailure`
    /// carrying the port's message, or `fallback` when that message is empty.
    #[must_use]
    pub fn from_write(error: RepositoryError, fallback: &str) -> Self {
        match error {
            RepositoryError::NotFound(message) => Self::NotFound(message),
            other => {
                let detail = other.detail().trim();
                if detail.is_empty() {
                    Self::WriteFailure(fallback.to_string())
                } else {
                    Self::WriteFailure(detail.to_string())
                }
            }
        }
    }

    /// Returns the client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::WriteFailure(message)
            | Self::RetrievalFailure(message) => message,
        }
    }
}
