//! Inbound event payloads from the backend agent runtime.
//!
//! Three event streams exist: `agent:message`, `agent:task` and
//! `agent:status`. They are delivered in emission order per session; the
//! renderer trusts the channel and never reorders by timestamp.

use serde::{Deserialize, Serialize};

use super::approval::ActionType;
use super::message::Message;
use super::model::SessionStatus;
use super::task::Task;

/// Event name for message deliveries.
pub const EVENT_AGENT_MESSAGE: &str = "agent:message";
/// Event name for task upserts.
pub const EVENT_AGENT_TASK: &str = "agent:task";
/// Event name for status transitions.
pub const EVENT_AGENT_STATUS: &str = "agent:status";

/// All event names the engine subscribes to, in subscription order.
pub const AGENT_EVENTS: [&str; 3] = [EVENT_AGENT_MESSAGE, EVENT_AGENT_TASK, EVENT_AGENT_STATUS];

/// Payload of `agent:message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub session_id: String,
    pub message: Message,
}

/// Payload of `agent:task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    pub session_id: String,
    pub task: Task,
}

/// Approval metadata attached to a `waiting` status event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload of `agent:status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub session_id: String,
    pub status: SessionStatus,
    /// Present when `status` is `waiting`: describes the gated action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalMetadata>,
}

/// A parsed backend event, routed by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Message(MessageEvent),
    Task(TaskEvent),
    Status(StatusEvent),
}

impl AgentEvent {
    /// The session this event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            Self::Message(ev) => &ev.session_id,
            Self::Task(ev) => &ev.session_id,
            Self::Status(ev) => &ev.session_id,
        }
    }

    /// Parses a raw event envelope by name.
    ///
    /// Returns `None` for event names the engine does not recognize.
    pub fn parse(
        name: &str,
        payload: serde_json::Value,
    ) -> Option<crate::error::Result<Self>> {
        let parsed = match name {
            EVENT_AGENT_MESSAGE => serde_json::from_value(payload).map(Self::Message),
            EVENT_AGENT_TASK => serde_json::from_value(payload).map(Self::Task),
            EVENT_AGENT_STATUS => serde_json::from_value(payload).map(Self::Status),
            _ => return None,
        };
        Some(parsed.map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_message_event() {
        let payload = json!({
            "sessionId": "s1",
            "message": {
                "id": "m1",
                "role": "assistant",
                "content": "hello",
                "timestamp": "2026-01-05T10:00:00Z"
            }
        });
        let event = AgentEvent::parse(EVENT_AGENT_MESSAGE, payload)
            .unwrap()
            .unwrap();
        assert_eq!(event.session_id(), "s1");
        match event {
            AgentEvent::Message(ev) => assert_eq!(ev.message.id, "m1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_status_event_with_approval() {
        let payload = json!({
            "sessionId": "s1",
            "status": "waiting",
            "approval": {
                "actionId": "a1",
                "actionType": "edit",
                "filePath": "a.ts"
            }
        });
        let event = AgentEvent::parse(EVENT_AGENT_STATUS, payload)
            .unwrap()
            .unwrap();
        match event {
            AgentEvent::Status(ev) => {
                assert_eq!(ev.status, SessionStatus::Waiting);
                let approval = ev.approval.unwrap();
                assert_eq!(approval.action_id.as_deref(), Some("a1"));
                assert_eq!(approval.file_path.as_deref(), Some("a.ts"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_event_name() {
        assert!(AgentEvent::parse("agent:unknown", json!({})).is_none());
    }

    #[test]
    fn test_parse_malformed_payload() {
        let result = AgentEvent::parse(EVENT_AGENT_TASK, json!({"sessionId": 42}));
        assert!(result.unwrap().is_err());
    }
}
