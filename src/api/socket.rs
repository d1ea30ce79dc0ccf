// WebSocket broadcast endpoint

use crate::api::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Messages a client may have queued before it is dropped as too slow
pub const CLIENT_QUEUE_CAPACITY: usize = 64;

/// Connected socket clients, keyed by session id
pub struct SocketHub {
    clients: RwLock<HashMap<Uuid, mpsc::Sender<String>>>,
}

impl SocketHub {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new client; returns its session id and outbound queue
    pub async fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let id = Uuid::new_v4();

        let mut clients = self.clients.write().await;
        clients.insert(id, tx);
        info!(session_id = %id, clients = clients.len(), "Socket session opened");

        (id, rx)
    }

    pub async fn unregister(&self, id: &Uuid) {
        let mut clients = self.clients.write().await;
        if clients.remove(id).is_some() {
            info!(session_id = %id, clients = clients.len(), "Socket session closed");
        }
    }

    /// Send `message` to every client without waiting. Clients whose queue is
    /// closed or full are dropped. Returns the number of clients reached.
    pub async fn broadcast(&self, message: &str) -> usize {
        let mut dropped = Vec::new();
        let mut delivered = 0;

        {
            let clients = self.clients.read().await;
            for (id, tx) in clients.iter() {
                match tx.try_send(message.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(session_id = %id, "Socket session queue full");
                        dropped.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => dropped.push(*id),
                }
            }
        }

        if !dropped.is_empty() {
            let mut clients = self.clients.write().await;
            for id in &dropped {
                clients.remove(id);
            }
            warn!(dropped = dropped.len(), "Dropped socket sessions");
        }

        debug!(delivered, "Broadcast sent");
        delivered
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for SocketHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Upgrade `/api/socket` to a WebSocket session
pub async fn socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = state.socket_hub.clone();
    ws.on_upgrade(move |socket| run_session(socket, hub))
}

async fn run_session(socket: WebSocket, hub: Arc<SocketHub>) {
    let (id, mut outbound) = hub.register().await;
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                match queued {
                    Some(text) => {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        info!(session_id = %id, message = %text, "Socket message received");
                        hub.broadcast(&text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(session_id = %id, error = %e, "Socket receive failed");
                        break;
                    }
                }
            }
        }
    }

    hub.unregister(&id).await;
}
