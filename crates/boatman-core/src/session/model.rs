//! Session domain model.
//!
//! A session is a live conversation with one backend agent process, scoped to
//! one project path. The renderer's copy is a cache over backend-owned truth:
//! the backend assigns the id and emits the events that mutate it.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::approval::ApprovalRequest;
use super::message::Message;
use super::pagination::Pagination;
use super::task::Task;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, nothing running.
    Idle,
    /// The agent is working.
    Running,
    /// The agent is paused on an approval gate.
    Waiting,
    /// The session failed.
    Error,
    /// The session was explicitly stopped.
    Stopped,
}

impl SessionStatus {
    /// Terminal states accept no further agent-directed intents.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error | Self::Stopped)
    }
}

/// The flavor of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Normal chat-driven session.
    Normal,
    /// Monitors external incident sources.
    Firefighter,
    /// Drives an end-to-end ticket/prompt workflow.
    Boatman,
}

/// The summary record the backend returns for a session.
///
/// This is the wire shape of `CreateAgentSession` / `ListAgentSessions`;
/// the full in-memory [`Session`] is built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Opaque backend-assigned session identifier.
    pub id: String,
    /// Project the session is scoped to.
    pub project_path: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Session flavor.
    #[serde(default = "default_mode")]
    pub mode: SessionMode,
    /// Backend-assigned creation instant.
    pub created_at: DateTime<Utc>,
    /// User-assigned tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Favorite flag.
    #[serde(default)]
    pub is_favorite: bool,
}

fn default_mode() -> SessionMode {
    SessionMode::Normal
}

/// The authoritative in-memory record for one session.
///
/// Invariants maintained by the store reducers:
/// - `messages` are ordered by `(timestamp, id)` with no duplicate ids.
/// - `status == Waiting` iff `pending_approval` is present.
/// - `tasks` holds exactly one record per task id.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub project_path: String,
    pub status: SessionStatus,
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub is_favorite: bool,
    pub messages: Vec<Message>,
    pub tasks: HashMap<String, Task>,
    pub pagination: Pagination,
    pub pending_approval: Option<ApprovalRequest>,
    /// True for placeholder rows seeded from an event for an unknown session;
    /// cleared once a `ListAgentSessions` snapshot fills the row in.
    pub needs_refresh: bool,
    /// Bumped on every mutation; selector memoization keys on it.
    pub revision: u64,
    /// Ids of accepted messages, for duplicate detection.
    message_ids: HashSet<String>,
}

impl Session {
    /// Builds a full session record from a backend summary.
    pub fn from_summary(summary: SessionSummary) -> Self {
        Self {
            id: summary.id,
            project_path: summary.project_path,
            status: summary.status,
            mode: summary.mode,
            created_at: summary.created_at,
            tags: summary.tags.into_iter().collect(),
            is_favorite: summary.is_favorite,
            messages: Vec::new(),
            tasks: HashMap::new(),
            pagination: Pagination::default(),
            pending_approval: None,
            needs_refresh: false,
            revision: 0,
            message_ids: HashSet::new(),
        }
    }

    /// Builds a placeholder row from an event for a session the store has
    /// never seen. Only the id and status are known; the row is marked for
    /// refresh by the next session-list snapshot.
    pub fn placeholder(id: String, status: SessionStatus) -> Self {
        Self {
            id,
            project_path: String::new(),
            status,
            mode: SessionMode::Normal,
            created_at: Utc::now(),
            tags: BTreeSet::new(),
            is_favorite: false,
            messages: Vec::new(),
            tasks: HashMap::new(),
            pagination: Pagination::default(),
            pending_approval: None,
            needs_refresh: true,
            revision: 0,
            message_ids: HashSet::new(),
        }
    }

    /// Overwrites the summary-level fields from a fresh backend snapshot,
    /// leaving messages, tasks and pagination untouched.
    pub fn fill_from_summary(&mut self, summary: SessionSummary) {
        self.project_path = summary.project_path;
        self.mode = summary.mode;
        self.created_at = summary.created_at;
        self.tags = summary.tags.into_iter().collect();
        self.is_favorite = summary.is_favorite;
        self.needs_refresh = false;
    }

    /// The summary-level view of this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            project_path: self.project_path.clone(),
            status: self.status,
            mode: self.mode,
            created_at: self.created_at,
            tags: self.tags.iter().cloned().collect(),
            is_favorite: self.is_favorite,
        }
    }

    /// Whether a message with this id has already been accepted.
    pub fn contains_message(&self, message_id: &str) -> bool {
        self.message_ids.contains(message_id)
    }

    /// Inserts a message preserving `(timestamp, id)` order.
    ///
    /// Returns false without touching the log when the id is a duplicate.
    pub fn insert_message(&mut self, message: Message) -> bool {
        if !self.message_ids.insert(message.id.clone()) {
            return false;
        }
        let key = message.sort_key();
        let idx = self.messages.partition_point(|m| m.sort_key() < key);
        self.messages.insert(idx, message);
        true
    }
}
