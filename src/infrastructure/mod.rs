//! Infrastructure module for task storage.
//!
//! This module contains the persistence port, its in-memory and `PostgreSQL`
//! adapters, and the factory that picks one at startup.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use factory::{
    ConfigurationError, DatabaseParts, DatabaseTarget, FactoryError, RepositoryConfig,
    RepositoryConfigBuilder, RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::{PostgresTaskRepository, TaskRow};
pub use repository::{
    RepositoryError, TaskClause, TaskPage, TaskPredicate, TaskQuery, TaskRepository,
    contains_ignore_case,
};
