//! User preference records.
//!
//! Preferences are backend-owned; the renderer mirrors them locally after a
//! successful save and otherwise treats them as a read-only snapshot. Most
//! knobs are advisory from the renderer's point of view: the backend enforces
//! approval policy and memory limits, the renderer only passes them through.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Advisory approval policy. Enforcement happens on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalMode {
    /// Every action is gated on user consent.
    #[default]
    Suggest,
    /// Edits are auto-approved, commands still gate.
    AutoEdit,
    /// Nothing gates.
    FullAuto,
}

/// UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// How the backend authenticates against the model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    #[default]
    AnthropicApi,
    GoogleCloud,
}

/// An MCP server descriptor, managed through the dedicated MCP calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Session-memory knobs, passed through to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemorySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_messages_per_session: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_old_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cleanup_sessions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_session_age_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_sessions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_agents_per_session: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_completed_agents: Option<bool>,
}

/// Credentials used by firefighter sessions to reach incident sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FirefighterCredentials {
    /// Wire name is the backend's historical spelling.
    #[serde(
        default,
        rename = "linearAPIKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub linear_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okta_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okta_api_token: Option<String>,
}

/// The full user preference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub approval_mode: ApprovalMode,
    #[serde(default)]
    pub default_model: String,
    #[serde(default)]
    pub theme: Theme,
    /// Gates the desktop-notification path.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cloud_project: Option<String>,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub firefighter: FirefighterCredentials,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            approval_mode: ApprovalMode::default(),
            default_model: String::new(),
            theme: Theme::default(),
            notifications_enabled: true,
            mcp_servers: Vec::new(),
            auth_method: AuthMethod::default(),
            anthropic_api_key: None,
            google_cloud_project: None,
            memory: MemorySettings::default(),
            firefighter: FirefighterCredentials::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&ApprovalMode::AutoEdit).unwrap(),
            "\"auto-edit\""
        );
        assert_eq!(
            serde_json::to_string(&ApprovalMode::FullAuto).unwrap(),
            "\"full-auto\""
        );
        assert_eq!(
            serde_json::to_string(&AuthMethod::AnthropicApi).unwrap(),
            "\"anthropic-api\""
        );
    }

    #[test]
    fn test_preferences_deserialize_sparse() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.approval_mode, ApprovalMode::Suggest);
        assert!(prefs.notifications_enabled);
        assert!(prefs.mcp_servers.is_empty());
    }
}
