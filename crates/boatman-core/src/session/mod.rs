//! Session domain module.
//!
//! Contains the session-related domain models and event payloads.
//!
//! # Module Structure
//!
//! - `model`: core session records (`Session`, `SessionSummary`, status/mode enums)
//! - `message`: conversation messages (`Message`, `MessageRole`, metadata)
//! - `task`: backend task records (`Task`, `TaskStatus`)
//! - `approval`: approval gates (`ApprovalRequest`, `ActionType`)
//! - `pagination`: message-log window state (`Pagination`)
//! - `event`: inbound `agent:*` event payloads

mod approval;
mod event;
mod message;
mod model;
mod pagination;
mod task;

// Re-export public API
pub use approval::{ActionType, ApprovalRequest};
pub use event::{
    AGENT_EVENTS, AgentEvent, ApprovalMetadata, EVENT_AGENT_MESSAGE, EVENT_AGENT_STATUS,
    EVENT_AGENT_TASK, MessageEvent, StatusEvent, TaskEvent,
};
pub use message::{CostInfo, Message, MessageMetadata, MessageRole};
pub use model::{Session, SessionMode, SessionStatus, SessionSummary};
pub use pagination::{DEFAULT_PAGE_SIZE, Pagination};
pub use task::{Task, TaskStatus};
