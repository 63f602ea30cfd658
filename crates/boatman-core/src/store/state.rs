//! The authoritative in-memory state and its reducers.
//!
//! Every reducer is a synchronous mutation of [`StoreState`]; suspension only
//! happens in the services that call them. Reducers are total: bad input is
//! reported through the return value, never by panicking.

use std::collections::{BTreeSet, HashMap};

use crate::project::Project;
use crate::session::{
    ApprovalRequest, Message, Pagination, Session, SessionStatus, SessionSummary, Task,
};

/// Result of applying [`StoreState::append_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The message was inserted in order.
    Appended,
    /// A message with this id already exists; the event was dropped.
    Duplicate,
    /// No session with this id is known locally.
    UnknownSession,
}

/// The renderer's authoritative model: sessions keyed by id, the active
/// selection, and the cached project list.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    sessions: HashMap<String, Session>,
    active_session_id: Option<String>,
    projects: Vec<Project>,
    /// Bumped when session-table membership changes.
    sessions_revision: u64,
    /// Bumped when the project list is replaced.
    projects_revision: u64,
    /// Events observed for sessions unknown locally.
    orphan_events: u64,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Read access
    // ============================================================================

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id
            .as_deref()
            .and_then(|id| self.sessions.get(id))
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn sessions_revision(&self) -> u64 {
        self.sessions_revision
    }

    pub fn projects_revision(&self) -> u64 {
        self.projects_revision
    }

    pub fn orphan_events(&self) -> u64 {
        self.orphan_events
    }

    // ============================================================================
    // Session membership reducers
    // ============================================================================

    /// Inserts a session built from a backend summary. No-op if the id is
    /// already present.
    pub fn add_session(&mut self, summary: SessionSummary) -> bool {
        if self.sessions.contains_key(&summary.id) {
            tracing::debug!("add_session: id already present: {}", summary.id);
            return false;
        }
        self.sessions
            .insert(summary.id.clone(), Session::from_summary(summary));
        self.sessions_revision += 1;
        true
    }

    /// Seeds a placeholder row for a session first observed through an event.
    pub fn insert_placeholder(&mut self, id: &str, status: SessionStatus) -> bool {
        if self.sessions.contains_key(id) {
            return false;
        }
        self.sessions
            .insert(id.to_string(), Session::placeholder(id.to_string(), status));
        self.sessions_revision += 1;
        true
    }

    /// Removes a session. Clears the active selection when it pointed here.
    pub fn remove_session(&mut self, id: &str) -> bool {
        if self.sessions.remove(id).is_none() {
            return false;
        }
        if self.active_session_id.as_deref() == Some(id) {
            self.active_session_id = None;
        }
        self.sessions_revision += 1;
        true
    }

    /// Sets the active session. Selecting an unknown id is refused.
    pub fn select_session(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if !self.sessions.contains_key(id) => false,
            _ => {
                self.active_session_id = id.map(str::to_string);
                true
            }
        }
    }

    /// Reconciles a `ListAgentSessions` snapshot with the local table.
    ///
    /// Unknown sessions are inserted; placeholder rows are filled in (their
    /// status stays event-driven); rows the store already owns are left
    /// untouched, since events and local intents keep them fresher than a
    /// point-in-time snapshot.
    pub fn sync_sessions(&mut self, summaries: Vec<SessionSummary>) {
        let mut changed = false;
        for summary in summaries {
            match self.sessions.get_mut(&summary.id) {
                None => {
                    self.sessions
                        .insert(summary.id.clone(), Session::from_summary(summary));
                    changed = true;
                }
                Some(session) if session.needs_refresh => {
                    session.fill_from_summary(summary);
                    session.revision += 1;
                    changed = true;
                }
                Some(_) => {}
            }
        }
        if changed {
            self.sessions_revision += 1;
        }
    }

    // ============================================================================
    // Per-session reducers
    // ============================================================================

    /// Replaces a session's status. Leaving `waiting` clears the pending
    /// approval.
    pub fn update_status(&mut self, id: &str, status: SessionStatus) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        let was_waiting = session.status == SessionStatus::Waiting;
        session.status = status;
        if was_waiting && status != SessionStatus::Waiting {
            session.pending_approval = None;
        }
        session.revision += 1;
        true
    }

    /// Appends a message preserving `(timestamp, id)` order, dropping
    /// duplicates by id.
    pub fn append_message(&mut self, id: &str, message: Message) -> AppendOutcome {
        let Some(session) = self.sessions.get_mut(id) else {
            return AppendOutcome::UnknownSession;
        };
        if session.insert_message(message) {
            session.revision += 1;
            AppendOutcome::Appended
        } else {
            AppendOutcome::Duplicate
        }
    }

    /// Marks a page load as outstanding.
    ///
    /// Returns false, leaving the state bit-identical, when a load is already
    /// in flight or the log is fully materialized; concurrent `load_more`
    /// calls collapse through this gate.
    pub fn begin_page_load(&mut self, id: &str) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        if !session.pagination.can_load_more() {
            return false;
        }
        session.pagination.in_flight = true;
        session.revision += 1;
        true
    }

    /// Clears the in-flight marker after a failed page load, leaving the
    /// message log untouched.
    pub fn fail_page_load(&mut self, id: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.pagination.in_flight = false;
            session.revision += 1;
        }
    }

    /// Merges a loaded page into the existing head, deduplicating by message
    /// id, and updates the pagination cursor.
    ///
    /// A completion for a session that has been removed is dropped silently;
    /// that is the discard path for loads cancelled by session removal.
    pub fn replace_messages(
        &mut self,
        id: &str,
        page: u32,
        page_size: u32,
        messages: Vec<Message>,
        has_more: bool,
    ) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            tracing::debug!("replace_messages: dropping page for removed session {}", id);
            return false;
        };
        for message in messages {
            // insert_message drops duplicates against the already-loaded head
            session.insert_message(message);
        }
        session.pagination = Pagination {
            page,
            page_size,
            has_more,
            in_flight: false,
        };
        session.revision += 1;
        true
    }

    /// Replaces the record at `task.id` or inserts it.
    pub fn upsert_task(&mut self, id: &str, task: Task) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.tasks.insert(task.id.clone(), task);
        session.revision += 1;
        true
    }

    /// Overwrites the tag set.
    pub fn set_tags(&mut self, id: &str, tags: BTreeSet<String>) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.tags = tags;
        session.revision += 1;
        true
    }

    /// Overwrites the favorite flag.
    pub fn set_favorite(&mut self, id: &str, is_favorite: bool) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.is_favorite = is_favorite;
        session.revision += 1;
        true
    }

    /// Sets or clears the pending approval request.
    pub fn set_pending_approval(&mut self, id: &str, request: Option<ApprovalRequest>) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.pending_approval = request;
        session.revision += 1;
        true
    }

    // ============================================================================
    // Projects and bookkeeping
    // ============================================================================

    /// Replaces the cached project list.
    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.projects_revision += 1;
    }

    /// Counts an event whose session id is unknown locally.
    pub fn record_orphan_event(&mut self) -> u64 {
        self.orphan_events += 1;
        self.orphan_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MessageRole, SessionMode, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn summary(id: &str) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            project_path: "/p".to_string(),
            status: SessionStatus::Idle,
            mode: SessionMode::Normal,
            created_at: Utc.timestamp_opt(1_000, 0).unwrap(),
            tags: Vec::new(),
            is_favorite: false,
        }
    }

    fn message(id: &str, secs: i64) -> Message {
        Message {
            id: id.to_string(),
            role: MessageRole::Assistant,
            content: "x".to_string(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            metadata: None,
        }
    }

    fn approval(session_id: &str) -> ApprovalRequest {
        ApprovalRequest {
            session_id: session_id.to_string(),
            action_id: Some("a1".to_string()),
            action_type: crate::session::ActionType::Edit,
            file_path: Some("a.ts".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_add_session_is_idempotent() {
        let mut state = StoreState::new();
        assert!(state.add_session(summary("s1")));
        assert!(!state.add_session(summary("s1")));
        assert_eq!(state.session_count(), 1);
    }

    #[test]
    fn test_add_then_remove_is_noop_on_sessions_slice() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        state.select_session(Some("s1"));
        assert!(state.remove_session("s1"));
        assert_eq!(state.session_count(), 0);
        assert_eq!(state.active_session_id(), None);
    }

    #[test]
    fn test_remove_session_keeps_unrelated_selection() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        state.add_session(summary("s2"));
        state.select_session(Some("s1"));
        state.remove_session("s2");
        assert_eq!(state.active_session_id(), Some("s1"));
    }

    #[test]
    fn test_select_unknown_session_is_refused() {
        let mut state = StoreState::new();
        assert!(!state.select_session(Some("ghost")));
        assert!(state.select_session(None));
    }

    #[test]
    fn test_leaving_waiting_clears_pending_approval() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        state.set_pending_approval("s1", Some(approval("s1")));
        state.update_status("s1", SessionStatus::Waiting);
        assert!(state.session("s1").unwrap().pending_approval.is_some());

        state.update_status("s1", SessionStatus::Running);
        let session = state.session("s1").unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert!(session.pending_approval.is_none());
    }

    #[test]
    fn test_append_message_deduplicates() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        assert_eq!(
            state.append_message("s1", message("m1", 10)),
            AppendOutcome::Appended
        );
        assert_eq!(
            state.append_message("s1", message("m1", 10)),
            AppendOutcome::Duplicate
        );
        assert_eq!(state.session("s1").unwrap().messages.len(), 1);
    }

    #[test]
    fn test_append_message_unknown_session() {
        let mut state = StoreState::new();
        assert_eq!(
            state.append_message("ghost", message("m1", 10)),
            AppendOutcome::UnknownSession
        );
    }

    #[test]
    fn test_begin_page_load_collapses() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        assert!(state.begin_page_load("s1"));
        // second call while in flight leaves state unchanged
        let before = state.session("s1").unwrap().clone();
        assert!(!state.begin_page_load("s1"));
        assert_eq!(state.session("s1").unwrap(), &before);
    }

    #[test]
    fn test_replace_messages_merges_and_orders() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        for i in 0..3 {
            state.append_message("s1", message(&format!("new{}", i), 100 + i));
        }
        state.begin_page_load("s1");
        // older page arrives, overlapping one id
        state.replace_messages(
            "s1",
            1,
            50,
            vec![message("old1", 10), message("old2", 20), message("new0", 100)],
            false,
        );

        let session = state.session("s1").unwrap();
        let ids: Vec<&str> = session.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["old1", "old2", "new0", "new1", "new2"]);
        assert_eq!(session.pagination.page, 1);
        assert!(!session.pagination.has_more);
        assert!(!session.pagination.in_flight);
    }

    #[test]
    fn test_replace_messages_for_removed_session_is_dropped() {
        let mut state = StoreState::new();
        assert!(!state.replace_messages("gone", 1, 50, vec![message("m", 1)], true));
    }

    #[test]
    fn test_terminal_pagination_blocks_further_loads() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        state.begin_page_load("s1");
        state.replace_messages("s1", 1, 50, Vec::new(), false);
        assert!(!state.begin_page_load("s1"));
    }

    #[test]
    fn test_upsert_task_replaces_atomically() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        let task = Task {
            id: "t1".to_string(),
            subject: "first".to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            metadata: None,
        };
        state.upsert_task("s1", task.clone());
        let updated = Task {
            status: TaskStatus::Completed,
            subject: "first (done)".to_string(),
            ..task
        };
        state.upsert_task("s1", updated);

        let session = state.session("s1").unwrap();
        assert_eq!(session.tasks.len(), 1);
        assert_eq!(session.tasks["t1"].status, TaskStatus::Completed);
    }

    #[test]
    fn test_orphan_counter() {
        let mut state = StoreState::new();
        assert_eq!(state.record_orphan_event(), 1);
        assert_eq!(state.record_orphan_event(), 2);
        assert_eq!(state.session_count(), 0);
    }

    #[test]
    fn test_sync_sessions_fills_placeholders_only() {
        let mut state = StoreState::new();
        state.insert_placeholder("s1", SessionStatus::Running);
        state.add_session(summary("s2"));
        state.set_favorite("s2", true);

        let mut snap1 = summary("s1");
        snap1.project_path = "/filled".to_string();
        snap1.status = SessionStatus::Idle;
        let snap2 = summary("s2");
        state.sync_sessions(vec![snap1, snap2, summary("s3")]);

        // placeholder filled, but its event-driven status kept
        let s1 = state.session("s1").unwrap();
        assert_eq!(s1.project_path, "/filled");
        assert_eq!(s1.status, SessionStatus::Running);
        assert!(!s1.needs_refresh);
        // existing row untouched by the snapshot
        assert!(state.session("s2").unwrap().is_favorite);
        // unknown row inserted
        assert!(state.session("s3").is_some());
    }

    #[test]
    fn test_revision_tracks_only_touched_session() {
        let mut state = StoreState::new();
        state.add_session(summary("s1"));
        state.add_session(summary("s2"));
        let r1 = state.session("s1").unwrap().revision;
        let r2 = state.session("s2").unwrap().revision;

        state.append_message("s1", message("m1", 1));

        assert!(state.session("s1").unwrap().revision > r1);
        assert_eq!(state.session("s2").unwrap().revision, r2);
    }
}
