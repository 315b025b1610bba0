//! WebSocket Connection Hub
//!
//! Owns the registry of open connections and relays valid messages from
//! one connection to every other one.
//!
//! The registry is an ordered map behind a tokio `RwLock`. Fan-out only
//! enqueues onto each connection's unbounded channel, so the lock is never
//! held across a socket write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::connection::{
    ConnectionHandle, ConnectionId, ConnectionState, OutboundFrame, OutboundSender,
};
use super::payload::{validate, PayloadError};

/// Manages all WebSocket connections and message relaying
pub struct ConnectionHub {
    /// Active connections in registration order
    connections: RwLock<BTreeMap<ConnectionId, ConnectionHandle>>,
    /// Source of connection ids
    next_id: AtomicU64,
    /// Set by `shutdown`; no registrations afterwards
    closed: AtomicBool,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone, Default)]
pub struct HubConfig {
    /// Maximum number of concurrent connections (`None` = unlimited)
    pub max_connections: Option<usize>,
}

/// Outcome of relaying one inbound message
#[derive(Debug)]
pub enum Relay {
    /// Payload was not valid JSON and was dropped
    Rejected(PayloadError),
    /// Payload was forwarded to the other connections
    Forwarded(FanOut),
}

impl Relay {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Relay::Rejected(_))
    }

    /// Number of recipients the payload was queued for
    pub fn delivered(&self) -> usize {
        match self {
            Relay::Rejected(_) => 0,
            Relay::Forwarded(fan_out) => fan_out.delivered,
        }
    }
}

/// Per-broadcast delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Recipients the frame was queued for
    pub delivered: usize,
    /// Recipients whose queue was already closed
    pub failed: usize,
    /// Registered recipients that were not open
    pub skipped: usize,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            config,
        }
    }

    /// Register a newly upgraded connection
    ///
    /// Always succeeds unless a connection limit is configured and reached,
    /// or the hub has been shut down.
    pub async fn on_connect(&self, sender: OutboundSender) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if self.closed.load(Ordering::Acquire) {
            return Err(HubError::ShutDown);
        }
        if let Some(limit) = self.config.max_connections {
            if connections.len() >= limit {
                return Err(HubError::TooManyConnections { limit });
            }
        }

        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handle = ConnectionHandle::new(sender);
        handle.state = ConnectionState::Open;
        connections.insert(id, handle);

        tracing::info!(
            connection_id = %id,
            total = connections.len(),
            "User connected"
        );
        Ok(id)
    }

    /// Validate a payload from `from` and forward it to every other open connection
    ///
    /// Invalid payloads are logged and dropped. A recipient whose queue is closed
    /// is counted as failed and the loop moves on.
    pub async fn on_message(&self, from: ConnectionId, payload: &str) -> Relay {
        tracing::debug!(connection_id = %from, payload = %payload, "Received message");

        if let Err(e) = validate(payload) {
            tracing::warn!(connection_id = %from, error = %e, "Invalid JSON received");
            return Relay::Rejected(e);
        }

        let frame: OutboundFrame = Arc::from(payload);
        let connections = self.connections.read().await;
        let mut fan_out = FanOut::default();

        for (id, handle) in connections.iter() {
            if *id == from {
                continue;
            }
            if !handle.state.is_open() {
                fan_out.skipped += 1;
                continue;
            }
            match handle.send(&frame) {
                Ok(()) => fan_out.delivered += 1,
                Err(e) => {
                    fan_out.failed += 1;
                    tracing::debug!(connection_id = %id, error = %e, "Delivery failed");
                }
            }
        }

        tracing::debug!(
            connection_id = %from,
            delivered = fan_out.delivered,
            failed = fan_out.failed,
            skipped = fan_out.skipped,
            "Broadcast message"
        );
        Relay::Forwarded(fan_out)
    }

    /// Remove a connection; returns false if it was already gone
    pub async fn on_disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        match connections.remove(&id) {
            Some(_) => {
                tracing::info!(
                    connection_id = %id,
                    total = connections.len(),
                    "User disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Move a registered connection to a new lifecycle state
    ///
    /// Returns false if the connection is not registered.
    pub async fn set_state(&self, id: ConnectionId, state: ConnectionState) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get_mut(&id) {
            Some(handle) => {
                tracing::trace!(
                    connection_id = %id,
                    from = %handle.state,
                    to = %state,
                    "State change"
                );
                handle.state = state;
                true
            }
            None => false,
        }
    }

    /// Current state of a connection; `Closed` once it has left the registry
    pub async fn state_of(&self, id: ConnectionId) -> ConnectionState {
        self.connections
            .read()
            .await
            .get(&id)
            .map(|h| h.state)
            .unwrap_or(ConnectionState::Closed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Close every connection and empty the registry
    ///
    /// Dropping the outbound senders ends each writer task, which closes its socket.
    pub async fn shutdown(&self) -> usize {
        let mut connections = self.connections.write().await;
        self.closed.store(true, Ordering::Release);
        let closed = connections.len();
        connections.clear();

        if closed > 0 {
            tracing::info!(closed, "Hub shut down");
        }
        closed
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {limit})")]
    TooManyConnections { limit: usize },

    #[error("Hub is shut down")]
    ShutDown,
}
