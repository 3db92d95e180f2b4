//! Domain module for task tracking.
//!
//! This module contains the task record and its lifecycle vocabulary.

pub mod task;

pub use task::{NewTask, Task, TaskId, TaskStatus, Timestamp, UnknownStatus};
