//! UI side of the channel layer

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::channel::EventChannel;
use crate::error::IpcError;
use crate::frame::{ResponseFrame, UiFrame};
use crate::hub::{ClientConnection, RequestSender};
use crate::message::{Command, Event};
use crate::result::CommandResult;
use crate::Result;

type Listener = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`UiClient::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub channel: EventChannel,
    id: u64,
}

pub struct UiClient {
    requests: RequestSender,
    next_request: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CommandResult<Value>>>>>,
    listeners: Arc<RwLock<HashMap<EventChannel, Vec<(u64, Listener)>>>>,
    next_listener: Arc<AtomicU64>,
}

impl UiClient {
    pub fn new(requests: RequestSender) -> Self {
        Self {
            requests,
            next_request: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_listener: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Wrap a hub connection and start dispatching its frames
    pub fn connect(connection: ClientConnection) -> (Self, tokio::task::JoinHandle<()>) {
        let client = Self::new(connection.requests);
        let runner = client.clone();
        let handle = tokio::spawn(async move { runner.run(connection.frames).await });
        (client, handle)
    }

    /// Request/response. Resolves once the matching response arrives.
    pub async fn invoke(&self, command: Command) -> Result<Value> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        if let Err(e) = self.requests.submit(Some(id), command) {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        let result = rx.await.map_err(|_| IpcError::Disconnected)?;
        Ok(result.into_result()?.unwrap_or(Value::Null))
    }

    /// One-way send
    pub fn send(&self, command: Command) -> Result<()> {
        self.requests.submit(None, command)
    }

    pub fn subscribe<F>(&self, channel: EventChannel, listener: F) -> Subscription
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(channel)
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription { channel, id }
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&subscription.channel) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != subscription.id);
        before != list.len()
    }

    pub async fn run(&self, mut frames: mpsc::UnboundedReceiver<UiFrame>) {
        while let Some(frame) = frames.recv().await {
            self.dispatch(frame);
        }

        // Background is gone; wake anyone still waiting
        self.pending.lock().clear();
        tracing::debug!(client = %self.requests.client(), "Frame stream ended");
    }

    pub fn dispatch(&self, frame: UiFrame) {
        match frame {
            UiFrame::Response(ResponseFrame { id, result }) => {
                let waiter = self.pending.lock().remove(&id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(result);
                    }
                    None => tracing::debug!(request_id = id, "Response with no waiter"),
                }
            }
            UiFrame::Event(frame) => {
                let Some(channel) = EventChannel::from_name(&frame.channel) else {
                    tracing::debug!(channel = %frame.channel, "Dropping unknown channel");
                    return;
                };

                match Event::decode(channel, frame.payload) {
                    Ok(event) => self.deliver(&event),
                    Err(e) => tracing::warn!(channel = %channel, error = %e, "Malformed event"),
                }
            }
        }
    }

    fn deliver(&self, event: &Event) {
        let channel = event.channel();
        // Snapshot so a listener may (un)subscribe while running
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(&channel)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(channel = %channel, error = %e, "Listener failed");
                }
                Err(_) => {
                    tracing::error!(channel = %channel, "Listener panicked");
                }
            }
        }
    }
}

impl Clone for UiClient {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            next_request: self.next_request.clone(),
            pending: self.pending.clone(),
            listeners: self.listeners.clone(),
            next_listener: self.next_listener.clone(),
        }
    }
}
