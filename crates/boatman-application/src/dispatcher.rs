//! Single point of ingress for backend events.
//!
//! Bridge handlers only enqueue `(event name, payload)` pairs; one drain task
//! pops them in arrival order and applies the matching reducer, so per-session
//! observed order equals backend emission order. The dispatcher trusts the
//! channel and never reorders by timestamp.

use serde_json::Value;
use tokio::sync::mpsc;

use boatman_core::session::{
    AgentEvent, ApprovalRequest, MessageEvent, SessionStatus, StatusEvent, TaskEvent,
};
use boatman_core::store::{AppendOutcome, SessionStore, StatusEventOutcome};

use crate::error_bus::UiErrorBus;

/// Routes raw backend events into store reducers.
pub struct EventDispatcher {
    store: SessionStore,
    errors: UiErrorBus,
}

impl EventDispatcher {
    pub fn new(store: SessionStore, errors: UiErrorBus) -> Self {
        Self { store, errors }
    }

    /// Drains the event queue until the bridge side closes it.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<(String, Value)>) {
        while let Some((name, payload)) = rx.recv().await {
            self.dispatch_raw(&name, payload).await;
        }
        tracing::debug!("event queue closed, dispatcher stopping");
    }

    /// Parses one raw envelope and applies it. Never panics: failures mark
    /// the affected session and surface a banner instead.
    pub async fn dispatch_raw(&self, name: &str, payload: Value) {
        // Keep the session id around for the malformed-payload path.
        let session_id = payload
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string);

        match AgentEvent::parse(name, payload) {
            None => {
                tracing::debug!("ignoring unrecognized event: {}", name);
            }
            Some(Err(err)) => {
                tracing::warn!("malformed {} payload: {}", name, err);
                match session_id {
                    Some(id) => self.fail_session(&id, "backend sent a malformed event").await,
                    None => {
                        self.errors.push("backend sent a malformed event");
                    }
                }
            }
            Some(Ok(event)) => self.dispatch(event).await,
        }
    }

    /// Applies a parsed event to the store.
    pub async fn dispatch(&self, event: AgentEvent) {
        match event {
            AgentEvent::Message(ev) => self.on_message(ev).await,
            AgentEvent::Task(ev) => self.on_task(ev).await,
            AgentEvent::Status(ev) => self.on_status(ev).await,
        }
    }

    async fn on_message(&self, ev: MessageEvent) {
        match self
            .store
            .append_message(&ev.session_id, ev.message)
            .await
        {
            AppendOutcome::Appended => {}
            AppendOutcome::Duplicate => {
                tracing::debug!("dropping duplicate message for session {}", ev.session_id);
            }
            AppendOutcome::UnknownSession => {
                let count = self.store.record_orphan_event().await;
                tracing::debug!(
                    "orphan message event for {} (total orphans: {})",
                    ev.session_id,
                    count
                );
            }
        }
    }

    async fn on_task(&self, ev: TaskEvent) {
        if !self.store.upsert_task(&ev.session_id, ev.task).await {
            let count = self.store.record_orphan_event().await;
            tracing::debug!(
                "orphan task event for {} (total orphans: {})",
                ev.session_id,
                count
            );
        }
    }

    async fn on_status(&self, ev: StatusEvent) {
        let approval = ev.approval.map(|meta| ApprovalRequest {
            session_id: ev.session_id.clone(),
            action_id: meta.action_id,
            action_type: meta.action_type,
            file_path: meta.file_path,
            description: meta.description,
        });

        match self
            .store
            .apply_status_event(&ev.session_id, ev.status, approval)
            .await
        {
            StatusEventOutcome::Applied => {}
            StatusEventOutcome::CreatedPlaceholder => {
                // Status is the one event that can seed a coherent row; it
                // still counts as an orphan observation.
                self.store.record_orphan_event().await;
                tracing::debug!(
                    "seeded placeholder for unknown session {} from status event",
                    ev.session_id
                );
            }
            StatusEventOutcome::MissingApproval => {
                self.fail_session(&ev.session_id, "approval request arrived without metadata")
                    .await;
            }
        }
    }

    /// Reducer-failure policy: sessions mid-work flip to `error`, everyone
    /// gets a banner, the store stays up.
    async fn fail_session(&self, id: &str, reason: &str) {
        if let Some(session) = self.store.session(id).await {
            if matches!(
                session.status,
                SessionStatus::Running | SessionStatus::Waiting
            ) {
                self.store.update_status(id, SessionStatus::Error).await;
            }
        }
        self.errors.push(format!("Session {}: {}", id, reason));
    }
}
