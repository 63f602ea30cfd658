//! Test support: a scripted in-memory bridge.
//!
//! Not compiled into downstream binaries in any meaningful way, but kept as a
//! normal module so the crate's integration tests can drive the engine
//! end to end without a real backend.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use boatman_core::bridge::{Bridge, EventHandler, Subscription};
use boatman_core::error::Result;

/// A [`Bridge`] that answers calls from a scripted response table, records
/// every call, and lets tests emit backend events synchronously.
///
/// Unscripted methods answer `null`, which suits the many fire-and-forget
/// calls on the backend surface.
pub struct ScriptedBridge {
    calls: Mutex<Vec<(String, Value)>>,
    responses: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    handlers: Arc<Mutex<HashMap<String, Vec<(u64, Arc<EventHandler>)>>>>,
    next_handler_id: Mutex<u64>,
}

impl ScriptedBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_handler_id: Mutex::new(1),
        })
    }

    /// Queues the next response for `method`.
    pub fn respond(&self, method: &str, response: Result<Value>) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `method` was called.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Delivers an event to the registered handlers, synchronously, in
    /// registration order.
    pub fn emit(&self, name: &str, payload: Value) {
        let targets: Vec<Arc<EventHandler>> = self
            .handlers
            .lock()
            .unwrap()
            .get(name)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        for handler in targets {
            handler(payload.clone());
        }
    }
}

#[async_trait]
impl Bridge for ScriptedBridge {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or(Ok(Value::Null))
    }

    fn subscribe(&self, event: &str, handler: EventHandler) -> Result<Subscription> {
        let id = {
            let mut next = self.next_handler_id.lock().unwrap();
            let id = *next;
            *next += 1;
            id
        };
        self.handlers
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));

        let handlers = self.handlers.clone();
        let event = event.to_string();
        Ok(Subscription::new(move || {
            if let Some(list) = handlers.lock().unwrap().get_mut(&event) {
                list.retain(|(handler_id, _)| *handler_id != id);
            }
        }))
    }
}
