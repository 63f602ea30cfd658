//! Task records attached to a session.

use serde::{Deserialize, Serialize};

/// Represents the current status of a backend task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task has been created but is not yet running.
    Pending,
    /// The task is currently being worked on.
    InProgress,
    /// The task completed.
    Completed,
}

/// A task tracked by the backend agent for a session.
///
/// Tasks are keyed by `id`, which is stable across updates; an update
/// replaces the whole record atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque backend-assigned task identifier.
    pub id: String,
    /// Short imperative title.
    pub subject: String,
    /// Longer description of the work.
    #[serde(default)]
    pub description: String,
    /// Current status.
    pub status: TaskStatus,
    /// Free-form backend payload, relayed opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}
