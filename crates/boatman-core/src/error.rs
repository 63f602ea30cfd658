//! Error types for the Boatman renderer core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the renderer-side engine.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BoatmanError {
    /// The bridge channel failed before a response arrived
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The bridge call deadline expired
    #[error("Transport call timed out: {method}")]
    Timeout { method: String },

    /// The backend reported a business error with a textual reason
    #[error("Backend error: {0}")]
    Remote(String),

    /// Entity not found locally, with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A decision was made while no approval request was outstanding
    #[error("No pending approval for session '{session_id}'")]
    NoPendingApproval { session_id: String },

    /// Duplicate message id, duplicate tag, or an intent against a closed session
    #[error("Conflict: {0}")]
    Conflict(String),

    /// IO error (persisted UI state operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BoatmanError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a Timeout error
    pub fn timeout(method: impl Into<String>) -> Self {
        Self::Timeout {
            method: method.into(),
        }
    }

    /// Creates a Remote error
    pub fn remote(reason: impl Into<String>) -> Self {
        Self::Remote(reason.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a NoPendingApproval error
    pub fn no_pending_approval(session_id: impl Into<String>) -> Self {
        Self::NoPendingApproval {
            session_id: session_id.into(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is a NoPendingApproval error
    pub fn is_no_pending_approval(&self) -> bool {
        matches!(self, Self::NoPendingApproval { .. })
    }

    /// Check if this error came from the bridge channel itself.
    ///
    /// Returns true for:
    /// - `Transport` errors (channel failure)
    /// - `Timeout` errors (deadline expiry)
    ///
    /// `Remote` errors are excluded: the channel worked, the backend refused.
    pub fn is_channel_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for BoatmanError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BoatmanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BoatmanError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for BoatmanError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for BoatmanError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, BoatmanError>`.
pub type Result<T> = std::result::Result<T, BoatmanError>;
