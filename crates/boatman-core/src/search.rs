//! Session-search wire types.
//!
//! Search itself runs on the backend; the engine only shapes the query and
//! relays the hits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionSummary;

/// Filters for `SearchSessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free-text query over message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Restrict to sessions carrying all of these tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Restrict to one project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,

    /// Restrict to favorites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,

    /// Restrict to sessions created at or after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,

    /// Restrict to sessions created at or before this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
}

/// One hit from `SearchSessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSearchResult {
    /// The matched session.
    #[serde(flatten)]
    pub summary: SessionSummary,

    /// Matched message excerpt, when the query hit message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}
