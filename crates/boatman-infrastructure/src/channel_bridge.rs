//! Channel-backed bridge transport.
//!
//! Wraps a pair of frame channels into the [`Bridge`] seam: outbound request
//! frames with correlation ids, inbound response/event frames drained by one
//! reader task. The reader is the only place events are dispatched from, so
//! handlers observe channel-delivery order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use boatman_core::bridge::{Bridge, EventHandler, Subscription};
use boatman_core::error::{BoatmanError, Result};

/// Default deadline for a bridge call.
pub const CALL_DEADLINE: Duration = Duration::from_secs(30);

/// Frame sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    #[serde(rename_all = "camelCase")]
    Request {
        id: u64,
        method: String,
        params: Value,
    },
}

/// Frame received from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundFrame {
    /// Answer to a request. `error` carries the backend's business-error
    /// reason; `result` is the payload otherwise.
    #[serde(rename_all = "camelCase")]
    Response {
        id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<String>,
    },
    /// A named event broadcast.
    #[serde(rename_all = "camelCase")]
    Event { name: String, payload: Value },
}

type PendingMap = HashMap<u64, oneshot::Sender<Result<Value>>>;
type HandlerMap = HashMap<String, Vec<(u64, Arc<EventHandler>)>>;

/// A [`Bridge`] over an in-process frame channel pair.
///
/// The concrete wire under the channels (Electron IPC, a socket, a pty) is
/// someone else's concern; everything in the engine sees only this seam.
pub struct ChannelBridge {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    pending: Arc<Mutex<PendingMap>>,
    handlers: Arc<Mutex<HandlerMap>>,
    next_request_id: AtomicU64,
    next_handler_id: AtomicU64,
    call_deadline: Duration,
    reader: JoinHandle<()>,
}

impl ChannelBridge {
    /// Wires the bridge up and spawns its reader task.
    pub fn new(
        outbound: mpsc::UnboundedSender<OutboundFrame>,
        inbound: mpsc::UnboundedReceiver<InboundFrame>,
    ) -> Self {
        Self::with_call_deadline(outbound, inbound, CALL_DEADLINE)
    }

    /// Same as [`ChannelBridge::new`] with an explicit call deadline.
    pub fn with_call_deadline(
        outbound: mpsc::UnboundedSender<OutboundFrame>,
        inbound: mpsc::UnboundedReceiver<InboundFrame>,
        call_deadline: Duration,
    ) -> Self {
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));
        let handlers: Arc<Mutex<HandlerMap>> = Arc::new(Mutex::new(HashMap::new()));

        let reader = tokio::spawn(Self::read_loop(
            inbound,
            pending.clone(),
            handlers.clone(),
        ));

        Self {
            outbound,
            pending,
            handlers,
            next_request_id: AtomicU64::new(1),
            next_handler_id: AtomicU64::new(1),
            call_deadline,
            reader,
        }
    }

    async fn read_loop(
        mut inbound: mpsc::UnboundedReceiver<InboundFrame>,
        pending: Arc<Mutex<PendingMap>>,
        handlers: Arc<Mutex<HandlerMap>>,
    ) {
        while let Some(frame) = inbound.recv().await {
            match frame {
                InboundFrame::Response { id, result, error } => {
                    let waiter = pending.lock().unwrap().remove(&id);
                    match waiter {
                        Some(tx) => {
                            let outcome = match error {
                                Some(reason) => Err(BoatmanError::remote(reason)),
                                None => Ok(result.unwrap_or(Value::Null)),
                            };
                            let _ = tx.send(outcome);
                        }
                        None => {
                            // Late arrival after a timeout already failed the call.
                            tracing::debug!("response for unknown request id {}", id);
                        }
                    }
                }
                InboundFrame::Event { name, payload } => {
                    // Clone the handler list out so a handler that
                    // subscribes/unsubscribes cannot deadlock the registry.
                    let targets: Vec<Arc<EventHandler>> = handlers
                        .lock()
                        .unwrap()
                        .get(&name)
                        .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                        .unwrap_or_default();
                    for handler in targets {
                        handler(payload.clone());
                    }
                }
            }
        }

        // Channel closed: every outstanding call fails.
        let drained: Vec<_> = pending.lock().unwrap().drain().collect();
        if !drained.is_empty() {
            tracing::warn!("bridge channel closed with {} pending calls", drained.len());
        }
        for (_, tx) in drained {
            let _ = tx.send(Err(BoatmanError::transport("bridge channel closed")));
        }
    }
}

#[async_trait]
impl Bridge for ChannelBridge {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        let frame = OutboundFrame::Request {
            id,
            method: method.to_string(),
            params,
        };
        if self.outbound.send(frame).is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(BoatmanError::transport("bridge channel closed"));
        }

        match tokio::time::timeout(self.call_deadline, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(BoatmanError::transport(
                "bridge dropped the call before responding",
            )),
            Err(_) => {
                self.pending.lock().unwrap().remove(&id);
                Err(BoatmanError::timeout(method))
            }
        }
    }

    fn subscribe(&self, event: &str, handler: EventHandler) -> Result<Subscription> {
        let handler_id = self.next_handler_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push((handler_id, Arc::new(handler)));

        let handlers = self.handlers.clone();
        let event = event.to_string();
        Ok(Subscription::new(move || {
            if let Some(list) = handlers.lock().unwrap().get_mut(&event) {
                list.retain(|(id, _)| *id != handler_id);
            }
        }))
    }
}

impl Drop for ChannelBridge {
    fn drop(&mut self) {
        self.reader.abort();
        for (_, tx) in self.pending.lock().unwrap().drain() {
            let _ = tx.send(Err(BoatmanError::transport("bridge torn down")));
        }
    }
}
