//! Transient error banners.
//!
//! Failures that the user should see but that do not corrupt the store land
//! here. Banners expire on their own; the presentation layer only renders
//! whatever `active()` returns.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

/// How long a banner stays visible.
const BANNER_TTL_SECS: i64 = 5;

/// One transient error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub id: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl ErrorBanner {
    /// Whether the banner has outlived its display window at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.raised_at >= Duration::seconds(BANNER_TTL_SECS)
    }
}

struct BusInner {
    banners: Mutex<Vec<ErrorBanner>>,
    changes: watch::Sender<u64>,
}

/// Fan-out point for user-visible, non-fatal failures.
///
/// Cheap to clone; clones share the banner list.
#[derive(Clone)]
pub struct UiErrorBus {
    inner: Arc<BusInner>,
}

impl UiErrorBus {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(BusInner {
                banners: Mutex::new(Vec::new()),
                changes,
            }),
        }
    }

    /// Raises a banner and returns its id.
    pub fn push(&self, message: impl Into<String>) -> String {
        let message = message.into();
        tracing::warn!("surfacing error banner: {}", message);
        let banner = ErrorBanner {
            id: uuid::Uuid::new_v4().to_string(),
            message,
            raised_at: Utc::now(),
        };
        let id = banner.id.clone();
        self.inner.banners.lock().unwrap().push(banner);
        self.inner.changes.send_modify(|tick| *tick += 1);
        id
    }

    /// Dismisses a banner before its timeout.
    pub fn dismiss(&self, id: &str) {
        let mut banners = self.inner.banners.lock().unwrap();
        let before = banners.len();
        banners.retain(|b| b.id != id);
        if banners.len() != before {
            drop(banners);
            self.inner.changes.send_modify(|tick| *tick += 1);
        }
    }

    /// The banners still within their display window, pruning expired ones.
    pub fn active(&self) -> Vec<ErrorBanner> {
        self.active_at(Utc::now())
    }

    /// Same as [`UiErrorBus::active`] against an explicit clock.
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<ErrorBanner> {
        let mut banners = self.inner.banners.lock().unwrap();
        banners.retain(|b| !b.is_expired_at(now));
        banners.clone()
    }

    /// Subscribes to banner-list changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }
}

impl Default for UiErrorBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_active() {
        let bus = UiErrorBus::new();
        bus.push("favorite toggle failed");
        let active = bus.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "favorite toggle failed");
    }

    #[test]
    fn test_banners_expire_after_ttl() {
        let bus = UiErrorBus::new();
        bus.push("transient");
        let later = Utc::now() + Duration::seconds(BANNER_TTL_SECS + 1);
        assert!(bus.active_at(later).is_empty());
        // and pruning is permanent
        assert!(bus.active_at(Utc::now()).is_empty());
    }

    #[test]
    fn test_dismiss_removes_banner() {
        let bus = UiErrorBus::new();
        let id = bus.push("dismiss me");
        bus.push("keep me");
        bus.dismiss(&id);
        let active = bus.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "keep me");
    }

    #[test]
    fn test_push_notifies_subscribers() {
        let bus = UiErrorBus::new();
        let rx = bus.subscribe();
        let before = *rx.borrow();
        bus.push("anything");
        assert!(*rx.borrow() > before);
    }
}
