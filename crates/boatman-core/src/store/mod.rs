//! The session store: single owner of all mutable renderer state.
//!
//! All state transitions run as synchronous reducers under one write lock,
//! which realizes the single-logical-queue model: only bridge calls suspend,
//! reducers never do. Readers go through snapshots or the memoized
//! [`selectors::Selectors`]; nothing outside this module mutates the records.

mod selectors;
mod state;

pub use selectors::Selectors;
pub use state::{AppendOutcome, StoreState};

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, watch};

use crate::project::Project;
use crate::session::{
    ApprovalRequest, Message, Pagination, Session, SessionStatus, SessionSummary, Task,
};

/// Result of [`SessionStore::apply_status_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEventOutcome {
    /// Applied to an existing session.
    Applied,
    /// The session was unknown; a placeholder row was seeded from the event.
    CreatedPlaceholder,
    /// `waiting` arrived without approval metadata; nothing was applied.
    MissingApproval,
}

/// Async façade over [`StoreState`].
///
/// Cheap to clone; all clones share the same state. Every mutation bumps the
/// change tick so selector subscribers can re-read.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<StoreState>>,
    changes: Arc<watch::Sender<u64>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(StoreState::new())),
            changes: Arc::new(changes),
        }
    }

    /// Subscribes to change notifications. The value is a monotonic tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|tick| *tick += 1);
    }

    /// Read access for snapshot-style projections.
    pub async fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().await
    }

    // ============================================================================
    // Snapshot accessors
    // ============================================================================

    pub async fn session(&self, id: &str) -> Option<Session> {
        self.state.read().await.session(id).cloned()
    }

    pub async fn active_session_id(&self) -> Option<String> {
        self.state
            .read()
            .await
            .active_session_id()
            .map(str::to_string)
    }

    pub async fn pagination_for(&self, id: &str) -> Option<Pagination> {
        self.state
            .read()
            .await
            .session(id)
            .map(|s| s.pagination.clone())
    }

    pub async fn orphan_events(&self) -> u64 {
        self.state.read().await.orphan_events()
    }

    // ============================================================================
    // Reducer dispatch
    // ============================================================================

    pub async fn add_session(&self, summary: SessionSummary) -> bool {
        let changed = self.state.write().await.add_session(summary);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn insert_placeholder(&self, id: &str, status: SessionStatus) -> bool {
        let changed = self.state.write().await.insert_placeholder(id, status);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn remove_session(&self, id: &str) -> bool {
        let changed = self.state.write().await.remove_session(id);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn select_session(&self, id: Option<&str>) -> bool {
        let changed = self.state.write().await.select_session(id);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn sync_sessions(&self, summaries: Vec<SessionSummary>) {
        self.state.write().await.sync_sessions(summaries);
        self.notify();
    }

    pub async fn update_status(&self, id: &str, status: SessionStatus) -> bool {
        let changed = self.state.write().await.update_status(id, status);
        if changed {
            self.notify();
        }
        changed
    }

    /// Applies a full status event atomically.
    ///
    /// The pending approval is set (or cleared, by `update_status`) under the
    /// same write lock as the status itself, so no reader ever observes
    /// `waiting` without its approval request. A status event for an unknown
    /// session seeds a placeholder row under that same lock.
    pub async fn apply_status_event(
        &self,
        id: &str,
        status: SessionStatus,
        approval: Option<ApprovalRequest>,
    ) -> StatusEventOutcome {
        let outcome = {
            let mut state = self.state.write().await;
            if status == SessionStatus::Waiting && approval.is_none() {
                // Cannot satisfy `waiting ⇔ pending_approval`; nothing applied.
                StatusEventOutcome::MissingApproval
            } else if state.session(id).is_none() {
                state.insert_placeholder(id, status);
                if let Some(request) = approval {
                    state.set_pending_approval(id, Some(request));
                }
                StatusEventOutcome::CreatedPlaceholder
            } else {
                if status == SessionStatus::Waiting {
                    state.set_pending_approval(id, approval);
                }
                state.update_status(id, status);
                StatusEventOutcome::Applied
            }
        };
        if outcome != StatusEventOutcome::MissingApproval {
            self.notify();
        }
        outcome
    }

    pub async fn append_message(&self, id: &str, message: Message) -> AppendOutcome {
        let outcome = self.state.write().await.append_message(id, message);
        if outcome == AppendOutcome::Appended {
            self.notify();
        }
        outcome
    }

    pub async fn begin_page_load(&self, id: &str) -> bool {
        let changed = self.state.write().await.begin_page_load(id);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn fail_page_load(&self, id: &str) {
        self.state.write().await.fail_page_load(id);
        self.notify();
    }

    pub async fn replace_messages(
        &self,
        id: &str,
        page: u32,
        page_size: u32,
        messages: Vec<Message>,
        has_more: bool,
    ) -> bool {
        let changed = self
            .state
            .write()
            .await
            .replace_messages(id, page, page_size, messages, has_more);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn upsert_task(&self, id: &str, task: Task) -> bool {
        let changed = self.state.write().await.upsert_task(id, task);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn set_tags(&self, id: &str, tags: BTreeSet<String>) -> bool {
        let changed = self.state.write().await.set_tags(id, tags);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn set_favorite(&self, id: &str, is_favorite: bool) -> bool {
        let changed = self.state.write().await.set_favorite(id, is_favorite);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn set_pending_approval(&self, id: &str, request: Option<ApprovalRequest>) -> bool {
        let changed = self.state.write().await.set_pending_approval(id, request);
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn set_projects(&self, projects: Vec<Project>) {
        self.state.write().await.set_projects(projects);
        self.notify();
    }

    pub async fn record_orphan_event(&self) -> u64 {
        self.state.write().await.record_orphan_event()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
