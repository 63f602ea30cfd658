//! The bridge to the backend agent runtime.
//!
//! The transport is an opaque bidirectional channel. This module defines the
//! seam the engine programs against: named request/response calls and named
//! event subscriptions. Concrete transports live in the infrastructure crate.

mod client;

pub use client::{BackendClient, BoatmanInputKind, GcloudAuthStatus, MessagePage};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Handler invoked for each delivery of a subscribed event.
///
/// Handlers run on the transport's dispatch task in channel-delivery order;
/// they must not block and typically just forward into a queue.
pub type EventHandler = Box<dyn Fn(Value) + Send + Sync>;

/// The transport seam.
///
/// The bridge does not retry, buffer, or interpret payloads. Calls fail with
/// `Transport` on channel failure, `Timeout` on deadline expiry, and
/// `Remote` when the backend reports a business error.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Issues a named request and awaits its result.
    async fn call(&self, method: &str, params: Value) -> Result<Value>;

    /// Registers a handler for a named event stream.
    ///
    /// Fails only when the subscription cannot be established at all, which
    /// the caller treats as fatal.
    fn subscribe(&self, event: &str, handler: EventHandler) -> Result<Subscription>;
}

/// Unsubscribe handle returned by [`Bridge::subscribe`].
///
/// Dropping the handle unsubscribes, so teardown is the natural consequence
/// of dropping the owning context.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps a cancel closure.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly unsubscribes.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
