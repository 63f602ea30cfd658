//! User intents against sessions.
//!
//! Data flow: intent → reducer (optimistic where noted) → bridge call → on
//! success nothing (the backend echoes through events, or local truth
//! stands), on failure a compensating reducer plus a banner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use tokio::sync::Mutex;

use boatman_core::bridge::{BackendClient, BoatmanInputKind};
use boatman_core::error::{BoatmanError, Result};
use boatman_core::session::{Session, SessionMode, SessionStatus, SessionSummary};
use boatman_core::store::SessionStore;

use crate::error_bus::UiErrorBus;

type FieldKey = (String, &'static str);

/// Intent surface for session lifecycle and metadata.
pub struct SessionUseCase {
    store: SessionStore,
    client: BackendClient,
    errors: UiErrorBus,
    /// One async mutex per `(session, field)`: a second optimistic intent for
    /// the same field queues behind the outstanding call instead of racing
    /// its rollback.
    field_locks: StdMutex<HashMap<FieldKey, Arc<Mutex<()>>>>,
}

impl SessionUseCase {
    pub fn new(store: SessionStore, client: BackendClient, errors: UiErrorBus) -> Self {
        Self {
            store,
            client,
            errors,
            field_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn field_lock(&self, id: &str, field: &'static str) -> Arc<Mutex<()>> {
        self.field_locks
            .lock()
            .unwrap()
            .entry((id.to_string(), field))
            .or_default()
            .clone()
    }

    async fn require_session(&self, id: &str) -> Result<Session> {
        self.store
            .session(id)
            .await
            .ok_or_else(|| BoatmanError::not_found("Session", id))
    }

    /// Sessions in a terminal state accept no further agent-directed intents.
    async fn require_open_session(&self, id: &str) -> Result<Session> {
        let session = self.require_session(id).await?;
        if session.status.is_terminal() {
            return Err(BoatmanError::conflict(format!(
                "session {} is {:?} and accepts no further intents",
                id, session.status
            )));
        }
        Ok(session)
    }

    // ============================================================================
    // Lifecycle intents
    // ============================================================================

    /// Creates a normal session and makes it active.
    pub async fn create_session(&self, project_path: &str) -> Result<SessionSummary> {
        let summary = self.client.create_agent_session(project_path).await?;
        let id = summary.id.clone();
        self.store.add_session(summary.clone()).await;
        self.store.select_session(Some(&id)).await;
        Ok(summary)
    }

    /// Creates a firefighter session scoped to an incident source.
    ///
    /// The backend returns only the id, so the local row starts from what we
    /// know; the next session-list snapshot trues it up.
    pub async fn create_firefighter_session(
        &self,
        project_path: &str,
        scope: &str,
    ) -> Result<String> {
        let id = self
            .client
            .create_firefighter_session(project_path, scope)
            .await?;
        self.insert_created(&id, project_path, SessionMode::Firefighter)
            .await;
        Ok(id)
    }

    /// Creates a boatman-mode session driven by a ticket or a prompt.
    pub async fn create_boatman_session(
        &self,
        project_path: &str,
        input: &str,
        kind: BoatmanInputKind,
        linear_api_key: Option<&str>,
    ) -> Result<String> {
        let id = self
            .client
            .create_boatman_mode_session(project_path, input, kind, linear_api_key)
            .await?;
        self.insert_created(&id, project_path, SessionMode::Boatman)
            .await;
        Ok(id)
    }

    async fn insert_created(&self, id: &str, project_path: &str, mode: SessionMode) {
        self.store
            .add_session(SessionSummary {
                id: id.to_string(),
                project_path: project_path.to_string(),
                status: SessionStatus::Idle,
                mode,
                created_at: Utc::now(),
                tags: Vec::new(),
                is_favorite: false,
            })
            .await;
        self.store.select_session(Some(id)).await;
    }

    pub async fn start_session(&self, id: &str) -> Result<()> {
        self.require_open_session(id).await?;
        self.client.start_agent_session(id).await
    }

    pub async fn stop_session(&self, id: &str) -> Result<()> {
        self.require_open_session(id).await?;
        self.client.stop_agent_session(id).await
    }

    /// Deletes a session on the backend, then drops the local row. Deletion
    /// is a metadata operation and is allowed in any state.
    pub async fn delete_session(&self, id: &str) -> Result<()> {
        self.require_session(id).await?;
        self.client.delete_agent_session(id).await?;
        self.store.remove_session(id).await;
        Ok(())
    }

    /// Sends a user message. No optimistic append: the backend echoes the
    /// accepted message (and the `running` transition) through events.
    pub async fn send_message(&self, id: &str, content: &str) -> Result<()> {
        self.require_open_session(id).await?;
        self.client.send_agent_message(id, content).await
    }

    /// Sets the active session locally. Passing `None` clears the selection.
    pub async fn select_session(&self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            self.require_session(id).await?;
        }
        self.store.select_session(id).await;
        Ok(())
    }

    // ============================================================================
    // Optimistic metadata intents
    // ============================================================================

    /// Sets the favorite flag optimistically.
    ///
    /// An intent that would not change the value issues no call at all, so a
    /// repeated toggle is idempotent.
    pub async fn set_favorite(&self, id: &str, is_favorite: bool) -> Result<()> {
        let lock = self.field_lock(id, "favorite");
        let _guard = lock.lock().await;

        let previous = self.require_session(id).await?.is_favorite;
        if previous == is_favorite {
            return Ok(());
        }

        self.store.set_favorite(id, is_favorite).await;
        match self.client.set_session_favorite(id, is_favorite).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!("rolling back favorite on {}: {}", id, err);
                self.store.set_favorite(id, previous).await;
                self.errors.push("Could not update favorite");
                Err(err)
            }
        }
    }

    /// Adds a tag optimistically. A duplicate tag is a local conflict and
    /// issues no call.
    pub async fn add_tag(&self, id: &str, tag: &str) -> Result<()> {
        let lock = self.field_lock(id, "tags");
        let _guard = lock.lock().await;

        let previous = self.require_session(id).await?.tags;
        if previous.contains(tag) {
            return Err(BoatmanError::conflict(format!(
                "session {} already has tag '{}'",
                id, tag
            )));
        }

        let mut updated = previous.clone();
        updated.insert(tag.to_string());
        self.store.set_tags(id, updated).await;

        match self.client.add_session_tag(id, tag).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!("rolling back tag add on {}: {}", id, err);
                self.store.set_tags(id, previous).await;
                self.errors.push("Could not add tag");
                Err(err)
            }
        }
    }

    /// Removes a tag optimistically. Removing an absent tag is a no-op.
    pub async fn remove_tag(&self, id: &str, tag: &str) -> Result<()> {
        let lock = self.field_lock(id, "tags");
        let _guard = lock.lock().await;

        let previous = self.require_session(id).await?.tags;
        if !previous.contains(tag) {
            return Ok(());
        }

        let mut updated = previous.clone();
        updated.remove(tag);
        self.store.set_tags(id, updated).await;

        match self.client.remove_session_tag(id, tag).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!("rolling back tag removal on {}: {}", id, err);
                self.store.set_tags(id, previous).await;
                self.errors.push("Could not remove tag");
                Err(err)
            }
        }
    }

    // ============================================================================
    // Firefighter intents
    // ============================================================================

    /// Toggles incident-source monitoring for a firefighter session.
    pub async fn toggle_monitoring(&self, id: &str, enabled: bool) -> Result<()> {
        self.require_firefighter_session(id).await?;
        self.client.toggle_firefighter_monitoring(id, enabled).await
    }

    /// Whether incident-source monitoring is active for a firefighter session.
    pub async fn is_monitoring_active(&self, id: &str) -> Result<bool> {
        self.require_firefighter_session(id).await?;
        self.client.is_monitoring_active(id).await
    }

    /// Points a firefighter session at a Linear ticket.
    pub async fn investigate_ticket(&self, id: &str, ticket_id: &str) -> Result<()> {
        self.require_firefighter_session(id).await?;
        self.client.investigate_linear_ticket(id, ticket_id).await
    }

    async fn require_firefighter_session(&self, id: &str) -> Result<Session> {
        let session = self.require_open_session(id).await?;
        if session.mode != SessionMode::Firefighter {
            return Err(BoatmanError::conflict(format!(
                "session {} is not a firefighter session",
                id
            )));
        }
        Ok(session)
    }

    // ============================================================================
    // Snapshots
    // ============================================================================

    /// Reloads the session list snapshot, filling placeholder rows.
    pub async fn refresh_sessions(&self) -> Result<()> {
        let summaries = self.client.list_agent_sessions().await?;
        self.store.sync_sessions(summaries).await;
        Ok(())
    }

    /// Reloads a session's task table from the backend.
    pub async fn refresh_tasks(&self, id: &str) -> Result<()> {
        self.require_session(id).await?;
        let tasks = self.client.get_agent_tasks(id).await?;
        for task in tasks {
            self.store.upsert_task(id, task).await;
        }
        Ok(())
    }

    /// Reloads the cached project list.
    pub async fn refresh_projects(&self) -> Result<()> {
        let projects = self.client.list_projects().await?;
        self.store.set_projects(projects).await;
        Ok(())
    }

    /// Opens (or registers) a project, then refreshes the cached list.
    pub async fn open_project(&self, path: &str) -> Result<()> {
        self.client.open_project(path).await?;
        self.refresh_projects().await
    }

    /// Removes a project, then refreshes the cached list.
    pub async fn remove_project(&self, id: &str) -> Result<()> {
        self.client.remove_project(id).await?;
        self.refresh_projects().await
    }
}
