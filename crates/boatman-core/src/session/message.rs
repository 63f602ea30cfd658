//! Conversation message types.
//!
//! Messages are backend-owned records: the renderer never edits one in place
//! once it has been accepted into a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

/// Usage and cost information attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CostInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_usd: Option<f64>,
}

/// Structured payloads the backend may attach to a message.
///
/// Tool-use and tool-result descriptors are backend-owned schemas; the
/// renderer relays them opaquely to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    /// Sub-agent identity for attribution, when the message came from a
    /// delegated agent rather than the top-level one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Tool invocation descriptor (backend schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use: Option<serde_json::Value>,

    /// Tool result descriptor (backend schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<serde_json::Value>,

    /// Token usage and cost information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostInfo>,
}

/// A single message in a session's conversation log.
///
/// The `id` and `timestamp` are assigned by the backend. Messages are ordered
/// by `(timestamp, id)` with the id breaking timestamp ties lexicographically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque backend-assigned message identifier.
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Backend-assigned timestamp.
    pub timestamp: DateTime<Utc>,
    /// Optional structured payloads (attribution, tool descriptors, cost).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// The ordering key for the conversation log: `(timestamp, id)`.
    pub fn sort_key(&self) -> (DateTime<Utc>, &str) {
        (self.timestamp, self.id.as_str())
    }
}
