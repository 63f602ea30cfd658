//! Approval requests: the gate at which the backend pauses a tool invocation
//! pending user consent.

use serde::{Deserialize, Serialize};

/// The kind of action awaiting approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// A file edit.
    Edit,
    /// A shell command.
    Command,
    /// Anything else.
    Other,
}

/// An outstanding approval request for a session.
///
/// Created from an inbound `agent:status` event carrying `waiting`; destroyed
/// by a user decision or by a later status event superseding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// The session the approval belongs to.
    pub session_id: String,
    /// Backend identifier for the gated action, when one was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// What kind of action is gated.
    pub action_type: ActionType,
    /// File the action touches, for edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Human-readable description of the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
