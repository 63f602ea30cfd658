//! Composition root for the renderer engine.
//!
//! Builds the store, wires the three `agent:*` subscriptions into one drain
//! task, runs the startup snapshot, and hands the presentation layer a single
//! context holding every service. Teardown drops the subscriptions and stops
//! the drain task.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use boatman_core::bridge::{BackendClient, Bridge, Subscription};
use boatman_core::error::Result;
use boatman_core::session::AGENT_EVENTS;
use boatman_core::store::{Selectors, SessionStore};
use boatman_core::ui_state::{UiState, UiStateRepository};

use crate::approvals::ApprovalCoordinator;
use crate::dispatcher::EventDispatcher;
use crate::error_bus::UiErrorBus;
use crate::overlay::{Overlay, OverlayController};
use crate::paginator::MessagePaginator;
use crate::preferences::PreferencesStore;
use crate::search::SearchClient;
use crate::session_usecase::SessionUseCase;

/// Everything the presentation layer talks to.
///
/// Created once at renderer start, torn down through
/// [`AppContext::shutdown`]. The store is the only mutable state; every
/// service here is a view or an intent surface over it.
pub struct AppContext {
    pub store: SessionStore,
    pub selectors: Selectors,
    pub errors: UiErrorBus,
    pub overlay: OverlayController,
    pub client: BackendClient,
    pub sessions: Arc<SessionUseCase>,
    pub approvals: Arc<ApprovalCoordinator>,
    pub paginator: Arc<MessagePaginator>,
    pub preferences: Arc<PreferencesStore>,
    pub search: Arc<SearchClient>,
    ui_state_repo: Option<Arc<dyn UiStateRepository>>,
    ui_state: Mutex<UiState>,
    subscriptions: Vec<Subscription>,
    drain: JoinHandle<()>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wires the engine up over a bridge and loads the startup snapshot.
    ///
    /// Failing to establish an event subscription is the one fatal startup
    /// error. Snapshot loads that fail only surface banners: events and later
    /// navigation refresh them.
    pub async fn bootstrap(
        bridge: Arc<dyn Bridge>,
        ui_state_repo: Option<Arc<dyn UiStateRepository>>,
    ) -> Result<Self> {
        let store = SessionStore::new();
        let selectors = Selectors::new(store.clone());
        let errors = UiErrorBus::new();
        let overlay = OverlayController::new();
        let client = BackendClient::new(bridge.clone());

        // All three event streams feed one queue; the single drain task is
        // what keeps per-session observed order equal to emission order.
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut subscriptions = Vec::with_capacity(AGENT_EVENTS.len());
        for name in AGENT_EVENTS {
            let tx = event_tx.clone();
            let subscription = bridge.subscribe(
                name,
                Box::new(move |payload| {
                    let _ = tx.send((name.to_string(), payload));
                }),
            )?;
            subscriptions.push(subscription);
        }
        let drain = tokio::spawn(EventDispatcher::new(store.clone(), errors.clone()).run(event_rx));

        let sessions = Arc::new(SessionUseCase::new(
            store.clone(),
            client.clone(),
            errors.clone(),
        ));
        let approvals = Arc::new(ApprovalCoordinator::new(store.clone(), client.clone()));
        let paginator = Arc::new(MessagePaginator::new(
            store.clone(),
            client.clone(),
            errors.clone(),
        ));
        let preferences = Arc::new(PreferencesStore::new(client.clone()));
        let search = Arc::new(SearchClient::new(client.clone()));

        if let Err(err) = sessions.refresh_sessions().await {
            tracing::warn!("[Bootstrap] session snapshot failed: {}", err);
            errors.push("Could not load sessions");
        }
        if let Err(err) = sessions.refresh_projects().await {
            tracing::warn!("[Bootstrap] project snapshot failed: {}", err);
            errors.push("Could not load projects");
        }
        match preferences.load().await {
            Ok(true) => {}
            Ok(false) => overlay.open(Overlay::Onboarding),
            Err(err) => {
                tracing::warn!("[Bootstrap] preference load failed: {}", err);
                errors.push("Could not load preferences");
            }
        }

        let ui_state = match &ui_state_repo {
            Some(repo) => repo.load().await.unwrap_or_else(|err| {
                tracing::warn!("[Bootstrap] persisted UI state unreadable: {}", err);
                UiState::default()
            }),
            None => UiState::default(),
        };

        tracing::info!("[Bootstrap] renderer engine ready");
        Ok(Self {
            store,
            selectors,
            errors,
            overlay,
            client,
            sessions,
            approvals,
            paginator,
            preferences,
            search,
            ui_state_repo,
            ui_state: Mutex::new(ui_state),
            subscriptions,
            drain,
        })
    }

    /// Snapshot of the persisted UI blob.
    pub async fn ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    /// Records the sidebar flag and persists the blob.
    pub async fn set_sidebar_open(&self, open: bool) -> Result<()> {
        let state = {
            let mut blob = self.ui_state.lock().await;
            blob.sidebar_open = open;
            blob.clone()
        };
        self.persist_ui_state(&state).await
    }

    /// Records the last-active project and persists the blob.
    pub async fn set_last_active_project(&self, project_id: Option<String>) -> Result<()> {
        let state = {
            let mut blob = self.ui_state.lock().await;
            blob.last_active_project_id = project_id;
            blob.clone()
        };
        self.persist_ui_state(&state).await
    }

    async fn persist_ui_state(&self, state: &UiState) -> Result<()> {
        match &self.ui_state_repo {
            Some(repo) => repo.save(state).await,
            None => Ok(()),
        }
    }

    /// Sends a desktop notification, gated on the user preference.
    pub async fn notify(&self, title: &str, message: &str) -> Result<()> {
        if !self.preferences.snapshot().notifications_enabled {
            tracing::debug!("notifications disabled, dropping: {}", title);
            return Ok(());
        }
        self.client.send_notification(title, message).await
    }

    /// Tears the engine down: unsubscribes from the bridge, stops the event
    /// drain, and persists the UI blob one last time.
    pub async fn shutdown(mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.drain.abort();
        let state = self.ui_state.lock().await.clone();
        if let Err(err) = self.persist_ui_state(&state).await {
            tracing::warn!("[Shutdown] could not persist UI state: {}", err);
        }
        tracing::debug!("[Shutdown] renderer engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBridge;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn scripted() -> Arc<ScriptedBridge> {
        let bridge = ScriptedBridge::new();
        bridge.respond("ListAgentSessions", Ok(json!([])));
        bridge.respond("ListProjects", Ok(json!([])));
        bridge.respond("GetPreferences", Ok(json!({})));
        bridge.respond("IsOnboardingCompleted", Ok(json!(true)));
        bridge
    }

    struct FakeUiStateRepo {
        saved: StdMutex<Vec<UiState>>,
    }

    impl FakeUiStateRepo {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                saved: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl UiStateRepository for FakeUiStateRepo {
        async fn load(&self) -> Result<UiState> {
            Ok(UiState {
                sidebar_open: true,
                last_active_project_id: Some("p1".to_string()),
            })
        }

        async fn save(&self, state: &UiState) -> Result<()> {
            self.saved.lock().unwrap().push(state.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_bootstrap_runs_startup_snapshot() {
        let bridge = scripted();
        let ctx = AppContext::bootstrap(bridge.clone(), None).await.unwrap();

        let methods: Vec<String> = bridge.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(
            methods,
            vec![
                "ListAgentSessions",
                "ListProjects",
                "GetPreferences",
                "IsOnboardingCompleted"
            ]
        );
        assert_eq!(ctx.overlay.current(), None);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_incomplete_onboarding_opens_wizard() {
        let bridge = ScriptedBridge::new();
        bridge.respond("ListAgentSessions", Ok(json!([])));
        bridge.respond("ListProjects", Ok(json!([])));
        bridge.respond("GetPreferences", Ok(json!({})));
        bridge.respond("IsOnboardingCompleted", Ok(json!(false)));

        let ctx = AppContext::bootstrap(bridge, None).await.unwrap();
        assert_eq!(ctx.overlay.current(), Some(Overlay::Onboarding));
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_snapshot_failure_surfaces_banner_not_fatal() {
        // Unscripted ListAgentSessions answers null, which fails to decode.
        let bridge = ScriptedBridge::new();
        bridge.respond("ListProjects", Ok(json!([])));
        bridge.respond("GetPreferences", Ok(json!({})));
        bridge.respond("IsOnboardingCompleted", Ok(json!(true)));

        let ctx = AppContext::bootstrap(bridge, None).await.unwrap();
        assert_eq!(ctx.errors.active().len(), 1);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_ui_state_restored_and_persisted() {
        let bridge = scripted();
        let repo = FakeUiStateRepo::new();
        let ctx = AppContext::bootstrap(bridge, Some(repo.clone() as Arc<dyn UiStateRepository>))
            .await
            .unwrap();

        let restored = ctx.ui_state().await;
        assert!(restored.sidebar_open);
        assert_eq!(restored.last_active_project_id.as_deref(), Some("p1"));

        ctx.set_sidebar_open(false).await.unwrap();
        ctx.set_last_active_project(Some("p2".to_string()))
            .await
            .unwrap();

        let saved = repo.saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert!(!saved[1].sidebar_open);
        assert_eq!(saved[1].last_active_project_id.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn test_notify_gated_on_preference() {
        let bridge = ScriptedBridge::new();
        bridge.respond("ListAgentSessions", Ok(json!([])));
        bridge.respond("ListProjects", Ok(json!([])));
        bridge.respond("GetPreferences", Ok(json!({ "notificationsEnabled": false })));
        bridge.respond("IsOnboardingCompleted", Ok(json!(true)));

        let ctx = AppContext::bootstrap(bridge.clone(), None).await.unwrap();
        ctx.notify("done", "agent finished").await.unwrap();
        assert_eq!(bridge.call_count("SendNotification"), 0);

        let mut prefs = ctx.preferences.snapshot();
        prefs.notifications_enabled = true;
        ctx.preferences.save(prefs).await.unwrap();
        ctx.notify("done", "agent finished").await.unwrap();
        assert_eq!(bridge.call_count("SendNotification"), 1);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes_event_streams() {
        let bridge = scripted();
        let ctx = AppContext::bootstrap(bridge.clone(), None).await.unwrap();
        let store = ctx.store.clone();
        ctx.shutdown().await;

        // Events after teardown reach no handler and mutate nothing.
        bridge.emit(
            "agent:status",
            json!({ "sessionId": "s1", "status": "running" }),
        );
        tokio::task::yield_now().await;
        assert!(store.session("s1").await.is_none());
        assert_eq!(store.orphan_events().await, 0);
    }
}
