//! Task domain model.
//!
//! This module contains the persisted unit of work tracked by the API and
//! the closed set of lifecycle labels it may carry.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// Clients treat it as an opaque string; internally it is a UUID assigned by
/// the persistence port when a draft is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses a client-supplied identifier.
    ///
    /// Returns `None` when the text cannot name any stored task.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Generates a new `TaskId` with a time-ordered UUID (v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

// =============================================================================
// Status
// =============================================================================

/// The lifecycle label of a task.
///
/// Only `Pending` and `Completed` are produced by the current operations;
/// the remaining variants are part of the stored vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    /// Initial state of every newly created task.
    #[default]
    Pending,
    /// Task is being worked on.
    #[serde(rename = "In-progress")]
    InProgress,
    /// Terminal state reached through completion.
    Completed,
    /// Task passed its due date.
    Overdue,
    /// Task was removed by its owner.
    Deleted,
}

impl TaskStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Overdue,
        Self::Deleted,
    ];

    /// Returns the stored and wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In-progress",
            Self::Completed => "Completed",
            Self::Overdue => "Overdue",
            Self::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown task status: '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

// =============================================================================
// Task
// =============================================================================

/// Fields a caller supplies when creating a task.
///
/// The status is carried explicitly so the service can force it; the port
/// assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Title of the task.
    pub title: String,
    /// Description of the task.
    pub description: String,
    /// Status the draft starts in.
    pub status: TaskStatus,
}

/// The persisted task entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, immutable once assigned.
    pub task_id: TaskId,
    /// Title of the task.
    pub title: String,
    /// Description of the task.
    pub description: String,
    /// Current status.
    pub status: TaskStatus,
    /// Set once at creation.
    pub created_at: Timestamp,
    /// Refreshed on every mutation.
    pub updated_at: Timestamp,
}

impl Task {
    /// Creates a new pending task.
    ///
    /// Both timestamps are set to `timestamp`, so `created_at == updated_at`
    /// until the first mutation.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            task_id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns a new task with the given status.
    #[must_use]
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }

    /// Returns a new task with `updated_at` moved to `timestamp`.
    ///
    /// `updated_at` never moves backwards, which keeps
    /// `created_at <= updated_at` even if the clock steps back.
    #[must_use]
    pub fn touched_at(self, timestamp: Timestamp) -> Self {
        let updated_at = self.updated_at.max(timestamp);
        Self { updated_at, ..self }
    }

    /// Returns a new task marked as completed at `timestamp`.
    ///
    /// Completing an already completed task is allowed and only refreshes
    /// `updated_at`.
    #[must_use]
    pub fn complete(self, timestamp: Timestamp) -> Self {
        self.with_status(TaskStatus::Completed).touched_at(timestamp)
    }

    /// Returns `true` if the task has reached `Completed`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

// =============================================================================
// Tests
// =============================================================================
