//! Pagination cursor for a session's message log.

use serde::{Deserialize, Serialize};

/// Default number of messages per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Describes how much of an unbounded message log is currently materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Last loaded page (0-indexed).
    pub page: u32,
    /// Messages per page.
    pub page_size: u32,
    /// Whether older pages remain on the backend.
    pub has_more: bool,
    /// Whether a page load is currently outstanding.
    pub in_flight: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            has_more: true,
            in_flight: false,
        }
    }
}

impl Pagination {
    /// Whether a `load_more` would do anything right now.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.in_flight
    }
}
