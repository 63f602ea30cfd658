//! Local mirror of backend-owned preferences and the onboarding flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use boatman_core::bridge::BackendClient;
use boatman_core::error::Result;
use boatman_core::preferences::Preferences;

/// Read-only preference snapshots with change notifications.
///
/// The backend owns the truth; this store mirrors it after loads and
/// successful saves and never mutates it on its own.
pub struct PreferencesStore {
    client: BackendClient,
    prefs: Arc<watch::Sender<Preferences>>,
    onboarding_completed: AtomicBool,
}

impl PreferencesStore {
    pub fn new(client: BackendClient) -> Self {
        let (prefs, _) = watch::channel(Preferences::default());
        Self {
            client,
            prefs: Arc::new(prefs),
            onboarding_completed: AtomicBool::new(true),
        }
    }

    /// Startup sequence: load preferences, then the onboarding flag.
    ///
    /// Returns whether onboarding has been completed; a `false` should open
    /// the onboarding surface.
    pub async fn load(&self) -> Result<bool> {
        let prefs = self.client.get_preferences().await?;
        self.prefs.send_replace(prefs);

        let completed = self.client.is_onboarding_completed().await?;
        self.onboarding_completed
            .store(completed, Ordering::Relaxed);
        Ok(completed)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Preferences {
        self.prefs.borrow().clone()
    }

    /// Subscribes to preference changes.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.prefs.subscribe()
    }

    /// Saves preferences to the backend, then mirrors them locally.
    pub async fn save(&self, prefs: Preferences) -> Result<()> {
        self.client.set_preferences(&prefs).await?;
        self.prefs.send_replace(prefs);
        Ok(())
    }

    /// Whether onboarding has been completed.
    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed.load(Ordering::Relaxed)
    }

    /// Marks onboarding complete on the backend and locally.
    pub async fn complete_onboarding(&self) -> Result<()> {
        self.client.complete_onboarding().await?;
        self.onboarding_completed.store(true, Ordering::Relaxed);
        Ok(())
    }
}
