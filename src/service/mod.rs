//! Service layer for task tracking.
//!
//! The service applies the business rules on top of a
//! [`TaskRepository`](crate::infrastructure::TaskRepository) and reports
//! failures through a small taxonomy the API maps to status codes.

pub mod error;
pub mod task_service;

pub use error::ServiceError;
pub use task_service::{LIST_LIMIT, TaskList, TaskService};
