//! Background side of the channel layer
//!
//! Every connected UI gets its own outbound frame queue. Requests from all
//! UIs funnel into one receiver owned by the background loop, so commands
//! are handled strictly in arrival order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::channel::CommandChannel;
use crate::error::IpcError;
use crate::frame::{EventFrame, RequestFrame, ResponseFrame, UiFrame};
use crate::message::{Command, Event};
use crate::result::CommandResult;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded command waiting for the background loop
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub client: ClientId,
    pub id: Option<u64>,
    pub command: Command,
}

pub struct RequestReceiver {
    rx: mpsc::UnboundedReceiver<Request>,
}

impl RequestReceiver {
    pub async fn recv(&mut self) -> Option<Request> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Request> {
        self.rx.try_recv().ok()
    }
}

/// UI → background entry point for one client
#[derive(Debug, Clone)]
pub struct RequestSender {
    client: ClientId,
    requests: mpsc::UnboundedSender<Request>,
    frames: mpsc::UnboundedSender<UiFrame>,
}

impl RequestSender {
    pub fn client(&self) -> ClientId {
        self.client
    }

    /// Submit a raw frame. Channels outside the allow-list are dropped
    /// without error.
    pub fn send_frame(&self, frame: RequestFrame) -> Result<()> {
        let Some(channel) = CommandChannel::from_name(&frame.channel) else {
            tracing::debug!(client = %self.client, channel = %frame.channel, "Dropping unknown channel");
            return Ok(());
        };

        match Command::decode(channel, frame.payload) {
            Ok(command) => self.submit(frame.id, command),
            Err(e) => {
                tracing::warn!(client = %self.client, channel = %channel, error = %e, "Rejected request");
                if let Some(id) = frame.id {
                    let response = ResponseFrame {
                        id,
                        result: CommandResult::err(e.to_string()),
                    };
                    self.frames
                        .send(UiFrame::Response(response))
                        .map_err(|_| IpcError::Disconnected)?;
                }
                Ok(())
            }
        }
    }

    pub fn submit(&self, id: Option<u64>, command: Command) -> Result<()> {
        self.requests
            .send(Request {
                client: self.client,
                id,
                command,
            })
            .map_err(|_| IpcError::Disconnected)
    }
}

/// Handed to a UI when it connects
pub struct ClientConnection {
    pub id: ClientId,
    pub requests: RequestSender,
    pub frames: mpsc::UnboundedReceiver<UiFrame>,
}

pub struct Hub {
    clients: Arc<RwLock<HashMap<ClientId, mpsc::UnboundedSender<UiFrame>>>>,
    requests: mpsc::UnboundedSender<Request>,
    next_id: Arc<AtomicU64>,
}

impl Hub {
    pub fn new() -> (Self, RequestReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            requests: tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (hub, RequestReceiver { rx })
    }

    pub fn connect(&self) -> ClientConnection {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        self.clients.write().insert(id, tx.clone());
        tracing::info!(client = %id, "UI connected");

        ClientConnection {
            id,
            requests: RequestSender {
                client: id,
                requests: self.requests.clone(),
                frames: tx,
            },
            frames: rx,
        }
    }

    pub fn disconnect(&self, id: ClientId) -> bool {
        let removed = self.clients.write().remove(&id).is_some();
        if removed {
            tracing::info!(client = %id, "UI disconnected");
        }
        removed
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Fan an event out to every UI. Returns how many received it.
    pub fn broadcast(&self, event: &Event) -> Result<usize> {
        let frame = UiFrame::Event(EventFrame::from_event(event)?);

        let mut closed = Vec::new();
        let mut delivered = 0;
        {
            let clients = self.clients.read();
            for (id, tx) in clients.iter() {
                if tx.send(frame.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
        }

        if !closed.is_empty() {
            let mut clients = self.clients.write();
            for id in closed {
                clients.remove(&id);
                tracing::debug!(client = %id, "Pruned closed UI");
            }
        }

        tracing::trace!(channel = %event.channel(), delivered, "Broadcast event");
        Ok(delivered)
    }

    pub fn respond(&self, client: ClientId, id: u64, result: CommandResult<Value>) {
        let sender = self.clients.read().get(&client).cloned();
        let Some(sender) = sender else {
            tracing::debug!(client = %client, request_id = id, "Response for departed UI");
            return;
        };

        if sender.send(UiFrame::Response(ResponseFrame { id, result })).is_err() {
            self.disconnect(client);
        }
    }

    /// Answer a request if it asked for a reply
    pub fn reply(&self, request: &Request, result: CommandResult<Value>) {
        if let Some(id) = request.id {
            self.respond(request.client, id, result);
        }
    }
}

impl Clone for Hub {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
            requests: self.requests.clone(),
            next_id: self.next_id.clone(),
        }
    }
}
