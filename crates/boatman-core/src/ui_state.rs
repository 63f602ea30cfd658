//! Persisted UI state.
//!
//! The renderer owns almost nothing durable: backend truth covers sessions,
//! projects and preferences. The one exception is this small blob, which
//! survives restarts so the window comes back the way it was left.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The `boatman-store` blob.
///
/// Intentionally minimal to avoid staleness against backend truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// Whether the sidebar is open.
    #[serde(default)]
    pub sidebar_open: bool,

    /// The project that was active when the renderer last shut down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_project_id: Option<String>,
}

/// Storage seam for the persisted UI blob.
#[async_trait]
pub trait UiStateRepository: Send + Sync {
    /// Loads the blob, falling back to defaults when none was saved yet.
    async fn load(&self) -> Result<UiState>;

    /// Persists the blob.
    async fn save(&self, state: &UiState) -> Result<()>;
}
