//! User decisions on approval gates.
//!
//! At most one decision goes out per `(session, action)`: repeats are dropped
//! locally. The backend clears the waiting state through a status event, so a
//! successful decision changes nothing locally.

use std::collections::HashSet;
use std::sync::Mutex;

use boatman_core::bridge::BackendClient;
use boatman_core::error::{BoatmanError, Result};
use boatman_core::store::SessionStore;

#[derive(Debug, Clone, Copy)]
enum Decision {
    Approve,
    Reject,
}

/// Coordinates approve/reject intents against pending approval requests.
pub struct ApprovalCoordinator {
    store: SessionStore,
    client: BackendClient,
    /// Decisions already sent this run, keyed by `(session, action)`.
    decided: Mutex<HashSet<(String, String)>>,
}

impl ApprovalCoordinator {
    pub fn new(store: SessionStore, client: BackendClient) -> Self {
        Self {
            store,
            client,
            decided: Mutex::new(HashSet::new()),
        }
    }

    /// Approves the pending action.
    pub async fn approve(&self, session_id: &str, action_id: Option<&str>) -> Result<()> {
        self.decide(session_id, action_id, Decision::Approve).await
    }

    /// Rejects the pending action.
    pub async fn reject(&self, session_id: &str, action_id: Option<&str>) -> Result<()> {
        self.decide(session_id, action_id, Decision::Reject).await
    }

    async fn decide(
        &self,
        session_id: &str,
        action_id: Option<&str>,
        decision: Decision,
    ) -> Result<()> {
        let session = self
            .store
            .session(session_id)
            .await
            .ok_or_else(|| BoatmanError::not_found("Session", session_id))?;

        if session.pending_approval.is_none() {
            return Err(BoatmanError::no_pending_approval(session_id));
        }

        let key = (
            session_id.to_string(),
            action_id.unwrap_or_default().to_string(),
        );
        if !self.decided.lock().unwrap().insert(key.clone()) {
            tracing::debug!(
                "dropping repeated {:?} for session {} action {:?}",
                decision,
                session_id,
                action_id
            );
            return Ok(());
        }

        let outcome = match decision {
            Decision::Approve => self.client.approve_agent_action(session_id, action_id).await,
            Decision::Reject => self.client.reject_agent_action(session_id, action_id).await,
        };

        if outcome.is_err() {
            // The decision never reached the backend; allow a retry.
            self.decided.lock().unwrap().remove(&key);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBridge;
    use boatman_core::session::{
        ActionType, ApprovalRequest, SessionMode, SessionStatus, SessionSummary,
    };
    use chrono::Utc;
    use std::sync::Arc;

    async fn waiting_store(session_id: &str) -> SessionStore {
        let store = SessionStore::new();
        store
            .add_session(SessionSummary {
                id: session_id.to_string(),
                project_path: "/p".to_string(),
                status: SessionStatus::Running,
                mode: SessionMode::Normal,
                created_at: Utc::now(),
                tags: Vec::new(),
                is_favorite: false,
            })
            .await;
        store
            .apply_status_event(
                session_id,
                SessionStatus::Waiting,
                Some(ApprovalRequest {
                    session_id: session_id.to_string(),
                    action_id: Some("a1".to_string()),
                    action_type: ActionType::Edit,
                    file_path: Some("a.ts".to_string()),
                    description: None,
                }),
            )
            .await;
        store
    }

    fn coordinator(
        store: SessionStore,
        bridge: Arc<ScriptedBridge>,
    ) -> ApprovalCoordinator {
        ApprovalCoordinator::new(store, BackendClient::new(bridge))
    }

    #[tokio::test]
    async fn test_approve_issues_one_call() {
        let store = waiting_store("s1").await;
        let bridge = ScriptedBridge::new();
        let coordinator = coordinator(store, bridge.clone());

        coordinator.approve("s1", Some("a1")).await.unwrap();

        let calls = bridge.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "ApproveAgentAction");
        assert_eq!(
            calls[0].1,
            serde_json::json!({ "id": "s1", "actionId": "a1" })
        );
    }

    #[tokio::test]
    async fn test_second_decision_is_dropped_locally() {
        let store = waiting_store("s1").await;
        let bridge = ScriptedBridge::new();
        let coordinator = coordinator(store, bridge.clone());

        coordinator.approve("s1", Some("a1")).await.unwrap();
        coordinator.reject("s1", Some("a1")).await.unwrap();

        assert_eq!(bridge.call_count("ApproveAgentAction"), 1);
        assert_eq!(bridge.call_count("RejectAgentAction"), 0);
    }

    #[tokio::test]
    async fn test_decision_without_pending_approval_makes_no_call() {
        let store = SessionStore::new();
        store
            .add_session(SessionSummary {
                id: "s1".to_string(),
                project_path: "/p".to_string(),
                status: SessionStatus::Running,
                mode: SessionMode::Normal,
                created_at: Utc::now(),
                tags: Vec::new(),
                is_favorite: false,
            })
            .await;
        let bridge = ScriptedBridge::new();
        let coordinator = coordinator(store, bridge.clone());

        let err = coordinator.approve("s1", Some("a1")).await.unwrap_err();
        assert!(err.is_no_pending_approval());
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_decision_allows_retry() {
        let store = waiting_store("s1").await;
        let bridge = ScriptedBridge::new();
        bridge.respond(
            "RejectAgentAction",
            Err(BoatmanError::timeout("RejectAgentAction")),
        );
        let coordinator = coordinator(store, bridge.clone());

        assert!(coordinator.reject("s1", Some("a1")).await.is_err());
        // Retry goes out again because the first never reached the backend.
        coordinator.reject("s1", Some("a1")).await.unwrap();
        assert_eq!(bridge.call_count("RejectAgentAction"), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let bridge = ScriptedBridge::new();
        let coordinator = coordinator(SessionStore::new(), bridge.clone());
        let err = coordinator.approve("ghost", None).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(bridge.calls().is_empty());
    }
}
