//! Backend session search.

use tokio::sync::RwLock;

use boatman_core::bridge::BackendClient;
use boatman_core::error::Result;
use boatman_core::search::{SearchQuery, SessionSearchResult};

/// Stateless wrapper over backend search.
///
/// The only thing cached is the available-tags list, which changes rarely
/// and feeds the filter UI.
pub struct SearchClient {
    client: BackendClient,
    tags: RwLock<Option<Vec<String>>>,
}

impl SearchClient {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            tags: RwLock::new(None),
        }
    }

    /// Runs a search on the backend.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SessionSearchResult>> {
        self.client.search_sessions(query).await
    }

    /// All tags in use, from cache when available.
    pub async fn available_tags(&self) -> Result<Vec<String>> {
        if let Some(tags) = self.tags.read().await.clone() {
            return Ok(tags);
        }
        self.refresh_tags().await
    }

    /// Reloads the tag list from the backend.
    pub async fn refresh_tags(&self) -> Result<Vec<String>> {
        let tags = self.client.get_all_tags().await?;
        *self.tags.write().await = Some(tags.clone());
        Ok(tags)
    }

    /// Drops the cached tag list; the next read refetches.
    pub async fn invalidate_tags(&self) {
        *self.tags.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBridge;
    use serde_json::json;

    #[tokio::test]
    async fn test_tags_are_cached_until_invalidated() {
        let bridge = ScriptedBridge::new();
        bridge.respond("GetAllTags", Ok(json!(["infra", "bug"])));
        bridge.respond("GetAllTags", Ok(json!(["infra", "bug", "new"])));
        let search = SearchClient::new(BackendClient::new(bridge.clone()));

        assert_eq!(search.available_tags().await.unwrap().len(), 2);
        assert_eq!(search.available_tags().await.unwrap().len(), 2);
        assert_eq!(bridge.call_count("GetAllTags"), 1);

        search.invalidate_tags().await;
        assert_eq!(search.available_tags().await.unwrap().len(), 3);
        assert_eq!(bridge.call_count("GetAllTags"), 2);
    }

    #[tokio::test]
    async fn test_search_forwards_filters() {
        let bridge = ScriptedBridge::new();
        bridge.respond("SearchSessions", Ok(json!([])));
        let search = SearchClient::new(BackendClient::new(bridge.clone()));

        let query = SearchQuery {
            query: Some("panic".to_string()),
            tags: vec!["infra".to_string()],
            is_favorite: Some(true),
            ..SearchQuery::default()
        };
        search.search(&query).await.unwrap();

        let calls = bridge.calls();
        assert_eq!(calls[0].0, "SearchSessions");
        assert_eq!(
            calls[0].1,
            json!({ "query": "panic", "tags": ["infra"], "isFavorite": true })
        );
    }
}
