//! Typed wrappers over the backend RPC surface.
//!
//! One method per backend call; the method names on the wire are the
//! backend's contract and must not drift.

use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::Bridge;
use crate::error::Result;
use crate::preferences::{McpServer, Preferences};
use crate::project::{GitStatus, Project, SessionStats, WorkspaceInfo};
use crate::search::{SearchQuery, SessionSearchResult};
use crate::session::{Message, SessionSummary, Task};

/// Input flavor for a boatman-mode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatmanInputKind {
    /// `input` is a ticket identifier.
    Ticket,
    /// `input` is a free-form prompt.
    Prompt,
}

/// Wire result of `GetAgentMessagesPaginated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

/// Wire result of the gcloud auth status helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GcloudAuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// Typed client over a [`Bridge`].
#[derive(Clone)]
pub struct BackendClient {
    bridge: Arc<dyn Bridge>,
}

impl BackendClient {
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    async fn invoke<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.bridge.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn invoke_unit(&self, method: &str, params: Value) -> Result<()> {
        self.bridge.call(method, params).await?;
        Ok(())
    }

    // ============================================================================
    // Sessions
    // ============================================================================

    pub async fn create_agent_session(&self, project_path: &str) -> Result<SessionSummary> {
        self.invoke("CreateAgentSession", json!({ "projectPath": project_path }))
            .await
    }

    pub async fn create_firefighter_session(
        &self,
        project_path: &str,
        scope: &str,
    ) -> Result<String> {
        self.invoke(
            "CreateFirefighterSession",
            json!({ "projectPath": project_path, "scope": scope }),
        )
        .await
    }

    pub async fn create_boatman_mode_session(
        &self,
        project_path: &str,
        input: &str,
        kind: BoatmanInputKind,
        linear_api_key: Option<&str>,
    ) -> Result<String> {
        self.invoke(
            "CreateBoatmanModeSession",
            json!({
                "projectPath": project_path,
                "input": input,
                "mode": kind,
                "linearAPIKey": linear_api_key,
            }),
        )
        .await
    }

    pub async fn start_agent_session(&self, id: &str) -> Result<()> {
        self.invoke_unit("StartAgentSession", json!({ "id": id }))
            .await
    }

    pub async fn stop_agent_session(&self, id: &str) -> Result<()> {
        self.invoke_unit("StopAgentSession", json!({ "id": id }))
            .await
    }

    pub async fn delete_agent_session(&self, id: &str) -> Result<()> {
        self.invoke_unit("DeleteAgentSession", json!({ "id": id }))
            .await
    }

    pub async fn list_agent_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.invoke("ListAgentSessions", json!({})).await
    }

    pub async fn send_agent_message(&self, id: &str, content: &str) -> Result<()> {
        self.invoke_unit("SendAgentMessage", json!({ "id": id, "content": content }))
            .await
    }

    pub async fn approve_agent_action(&self, id: &str, action_id: Option<&str>) -> Result<()> {
        self.invoke_unit(
            "ApproveAgentAction",
            json!({ "id": id, "actionId": action_id }),
        )
        .await
    }

    pub async fn reject_agent_action(&self, id: &str, action_id: Option<&str>) -> Result<()> {
        self.invoke_unit(
            "RejectAgentAction",
            json!({ "id": id, "actionId": action_id }),
        )
        .await
    }

    pub async fn get_agent_messages(&self, id: &str) -> Result<Vec<Message>> {
        self.invoke("GetAgentMessages", json!({ "id": id })).await
    }

    pub async fn get_agent_messages_paginated(
        &self,
        id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage> {
        self.invoke(
            "GetAgentMessagesPaginated",
            json!({ "id": id, "page": page, "pageSize": page_size }),
        )
        .await
    }

    pub async fn get_agent_tasks(&self, id: &str) -> Result<Vec<Task>> {
        self.invoke("GetAgentTasks", json!({ "id": id })).await
    }

    pub async fn set_session_favorite(&self, id: &str, is_favorite: bool) -> Result<()> {
        self.invoke_unit(
            "SetSessionFavorite",
            json!({ "id": id, "isFavorite": is_favorite }),
        )
        .await
    }

    pub async fn add_session_tag(&self, id: &str, tag: &str) -> Result<()> {
        self.invoke_unit("AddSessionTag", json!({ "id": id, "tag": tag }))
            .await
    }

    pub async fn remove_session_tag(&self, id: &str, tag: &str) -> Result<()> {
        self.invoke_unit("RemoveSessionTag", json!({ "id": id, "tag": tag }))
            .await
    }

    pub async fn toggle_firefighter_monitoring(&self, id: &str, enabled: bool) -> Result<()> {
        self.invoke_unit(
            "ToggleFirefighterMonitoring",
            json!({ "id": id, "enabled": enabled }),
        )
        .await
    }

    pub async fn is_monitoring_active(&self, id: &str) -> Result<bool> {
        self.invoke("IsMonitoringActive", json!({ "id": id })).await
    }

    pub async fn investigate_linear_ticket(&self, id: &str, ticket_id: &str) -> Result<()> {
        self.invoke_unit(
            "InvestigateLinearTicket",
            json!({ "id": id, "ticketId": ticket_id }),
        )
        .await
    }

    // ============================================================================
    // Projects & workspace
    // ============================================================================

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.invoke("ListProjects", json!({})).await
    }

    pub async fn open_project(&self, path: &str) -> Result<()> {
        self.invoke_unit("OpenProject", json!({ "path": path }))
            .await
    }

    pub async fn remove_project(&self, id: &str) -> Result<()> {
        self.invoke_unit("RemoveProject", json!({ "id": id })).await
    }

    /// Opens the native folder picker. `None` when the user cancelled.
    pub async fn select_folder(&self) -> Result<Option<String>> {
        let path: String = self.invoke("SelectFolder", json!({})).await?;
        Ok(if path.is_empty() { None } else { Some(path) })
    }

    pub async fn get_workspace_info(&self, path: &str) -> Result<WorkspaceInfo> {
        self.invoke("GetWorkspaceInfo", json!({ "path": path }))
            .await
    }

    pub async fn get_git_status(&self, path: &str) -> Result<GitStatus> {
        self.invoke("GetGitStatus", json!({ "path": path })).await
    }

    pub async fn get_git_diff(&self, path: &str, git_ref: &str) -> Result<String> {
        self.invoke("GetGitDiff", json!({ "path": path, "ref": git_ref }))
            .await
    }

    /// Diff structures are backend-owned; the renderer relays them opaquely.
    pub async fn parse_diff(&self, text: &str) -> Result<Value> {
        self.invoke("ParseDiff", json!({ "text": text })).await
    }

    pub async fn get_side_by_side_diff(&self, file_diff: Value) -> Result<Value> {
        self.invoke("GetSideBySideDiff", json!({ "fileDiff": file_diff }))
            .await
    }

    // ============================================================================
    // Preferences & onboarding
    // ============================================================================

    pub async fn get_preferences(&self) -> Result<Preferences> {
        self.invoke("GetPreferences", json!({})).await
    }

    pub async fn set_preferences(&self, prefs: &Preferences) -> Result<()> {
        self.invoke_unit("SetPreferences", json!({ "prefs": prefs }))
            .await
    }

    pub async fn is_onboarding_completed(&self) -> Result<bool> {
        self.invoke("IsOnboardingCompleted", json!({})).await
    }

    pub async fn complete_onboarding(&self) -> Result<()> {
        self.invoke_unit("CompleteOnboarding", json!({})).await
    }

    // ============================================================================
    // MCP servers
    // ============================================================================

    pub async fn get_mcp_servers(&self) -> Result<Vec<McpServer>> {
        self.invoke("GetMCPServers", json!({})).await
    }

    pub async fn add_mcp_server(&self, server: &McpServer) -> Result<()> {
        self.invoke_unit("AddMCPServer", json!({ "server": server }))
            .await
    }

    pub async fn remove_mcp_server(&self, name: &str) -> Result<()> {
        self.invoke_unit("RemoveMCPServer", json!({ "name": name }))
            .await
    }

    pub async fn update_mcp_server(&self, server: &McpServer) -> Result<()> {
        self.invoke_unit("UpdateMCPServer", json!({ "server": server }))
            .await
    }

    pub async fn get_mcp_presets(&self) -> Result<Vec<McpServer>> {
        self.invoke("GetMCPPresets", json!({})).await
    }

    // ============================================================================
    // Search
    // ============================================================================

    pub async fn search_sessions(&self, query: &SearchQuery) -> Result<Vec<SessionSearchResult>> {
        self.invoke("SearchSessions", serde_json::to_value(query)?)
            .await
    }

    pub async fn get_all_tags(&self) -> Result<Vec<String>> {
        self.invoke("GetAllTags", json!({})).await
    }

    // ============================================================================
    // Maintenance & misc
    // ============================================================================

    pub async fn cleanup_old_sessions(&self) -> Result<u64> {
        self.invoke("CleanupOldSessions", json!({})).await
    }

    pub async fn get_session_stats(&self) -> Result<SessionStats> {
        self.invoke("GetSessionStats", json!({})).await
    }

    pub async fn send_notification(&self, title: &str, message: &str) -> Result<()> {
        self.invoke_unit(
            "SendNotification",
            json!({ "title": title, "message": message }),
        )
        .await
    }

    pub async fn get_gcloud_auth_status(&self) -> Result<GcloudAuthStatus> {
        self.invoke("GetGcloudAuthStatus", json!({})).await
    }

    pub async fn gcloud_auth_login(&self) -> Result<()> {
        self.invoke_unit("GcloudAuthLogin", json!({})).await
    }
}
