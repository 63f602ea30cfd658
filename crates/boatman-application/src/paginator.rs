//! Windowed loading of a session's message history.

use boatman_core::bridge::BackendClient;
use boatman_core::error::{BoatmanError, Result};
use boatman_core::store::SessionStore;

use crate::error_bus::UiErrorBus;

/// Loads older message pages on demand.
///
/// Concurrent `load_more` calls for one session collapse: the in-flight
/// marker is taken under the store's write lock, so only the first call
/// issues a request.
pub struct MessagePaginator {
    store: SessionStore,
    client: BackendClient,
    errors: UiErrorBus,
}

impl MessagePaginator {
    pub fn new(store: SessionStore, client: BackendClient, errors: UiErrorBus) -> Self {
        Self {
            store,
            client,
            errors,
        }
    }

    /// Requests the next older page for a session.
    ///
    /// Returns `Ok(false)` without touching anything when a load is already
    /// in flight or the log is fully materialized; `Ok(true)` when a page was
    /// requested and merged.
    pub async fn load_more(&self, id: &str) -> Result<bool> {
        let pagination = self
            .store
            .pagination_for(id)
            .await
            .ok_or_else(|| BoatmanError::not_found("Session", id))?;

        if !pagination.can_load_more() {
            return Ok(false);
        }
        if !self.store.begin_page_load(id).await {
            // Another caller won the race for the in-flight marker.
            return Ok(false);
        }

        let next_page = pagination.page + 1;
        match self
            .client
            .get_agent_messages_paginated(id, next_page, pagination.page_size)
            .await
        {
            Ok(page) => {
                // A removal while the call was in flight makes this a no-op.
                let applied = self
                    .store
                    .replace_messages(
                        id,
                        next_page,
                        pagination.page_size,
                        page.messages,
                        page.has_more,
                    )
                    .await;
                if !applied {
                    tracing::debug!("discarding page for removed session {}", id);
                }
                Ok(true)
            }
            Err(err) => {
                self.store.fail_page_load(id).await;
                self.errors.push("Could not load older messages");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBridge;
    use boatman_core::session::{SessionMode, SessionStatus, SessionSummary};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    fn paginator(bridge: Arc<ScriptedBridge>) -> (MessagePaginator, SessionStore, UiErrorBus) {
        let store = SessionStore::new();
        let errors = UiErrorBus::new();
        (
            MessagePaginator::new(store.clone(), BackendClient::new(bridge), errors.clone()),
            store,
            errors,
        )
    }

    async fn seed(store: &SessionStore, id: &str) {
        store
            .add_session(SessionSummary {
                id: id.to_string(),
                project_path: "/p".to_string(),
                status: SessionStatus::Running,
                mode: SessionMode::Normal,
                created_at: Utc::now(),
                tags: Vec::new(),
                is_favorite: false,
            })
            .await;
    }

    fn page_payload(prefix: &str, count: usize, has_more: bool) -> serde_json::Value {
        let messages: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "id": format!("{}{:03}", prefix, i),
                    "role": "assistant",
                    "content": "x",
                    "timestamp": format!("2026-01-05T09:{:02}:{:02}Z", i / 60, i % 60)
                })
            })
            .collect();
        json!({ "messages": messages, "hasMore": has_more })
    }

    #[tokio::test]
    async fn test_load_more_requests_next_page() {
        let bridge = ScriptedBridge::new();
        bridge.respond(
            "GetAgentMessagesPaginated",
            Ok(page_payload("old", 50, false)),
        );
        let (paginator, store, _) = paginator(bridge.clone());
        seed(&store, "s1").await;

        assert!(paginator.load_more("s1").await.unwrap());

        let calls = bridge.calls();
        assert_eq!(
            calls[0].1,
            json!({ "id": "s1", "page": 1, "pageSize": 50 })
        );
        let session = store.session("s1").await.unwrap();
        assert_eq!(session.messages.len(), 50);
        assert_eq!(session.pagination.page, 1);
        assert!(!session.pagination.has_more);
        assert!(!session.pagination.in_flight);
    }

    #[tokio::test]
    async fn test_load_more_is_noop_when_terminal() {
        let bridge = ScriptedBridge::new();
        bridge.respond(
            "GetAgentMessagesPaginated",
            Ok(page_payload("old", 1, false)),
        );
        let (paginator, store, _) = paginator(bridge.clone());
        seed(&store, "s1").await;

        assert!(paginator.load_more("s1").await.unwrap());
        // hasMore=false: further loads never hit the bridge
        assert!(!paginator.load_more("s1").await.unwrap());
        assert_eq!(bridge.call_count("GetAgentMessagesPaginated"), 1);
    }

    #[tokio::test]
    async fn test_load_more_is_noop_while_in_flight() {
        let bridge = ScriptedBridge::new();
        let (paginator, store, _) = paginator(bridge.clone());
        seed(&store, "s1").await;
        store.begin_page_load("s1").await;

        let before = store.session("s1").await.unwrap();
        assert!(!paginator.load_more("s1").await.unwrap());
        assert_eq!(store.session("s1").await.unwrap(), before);
        assert_eq!(bridge.call_count("GetAgentMessagesPaginated"), 0);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_log_unchanged() {
        let bridge = ScriptedBridge::new();
        bridge.respond(
            "GetAgentMessagesPaginated",
            Err(BoatmanError::timeout("GetAgentMessagesPaginated")),
        );
        let (paginator, store, errors) = paginator(bridge);
        seed(&store, "s1").await;

        assert!(paginator.load_more("s1").await.is_err());

        let session = store.session("s1").await.unwrap();
        assert!(session.messages.is_empty());
        assert!(!session.pagination.in_flight);
        assert!(session.pagination.has_more);
        assert_eq!(errors.active().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let bridge = ScriptedBridge::new();
        let (paginator, _, _) = paginator(bridge);
        assert!(paginator.load_more("ghost").await.unwrap_err().is_not_found());
    }
}
