//! Connection Types
//!
//! Identity, lifecycle state, and the outbound handle the hub keeps for
//! each registered WebSocket.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A frame queued for delivery to one connection.
///
/// Shared between all recipients of a broadcast so fan-out never copies the payload.
pub type OutboundFrame = Arc<str>;

/// Sending half of a connection's outbound queue
pub type OutboundSender = mpsc::UnboundedSender<OutboundFrame>;

/// Unique identifier for a connection within one hub
///
/// Ids are handed out in registration order, which is also the order the
/// registry iterates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle of a connection
///
/// Only `Open` connections are fan-out targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake finished, not yet registered
    Connecting,
    /// Registered and accepting frames
    Open,
    /// Peer sent a close frame or the socket failed; removal pending
    Closing,
    /// No longer in the registry
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Registry entry for one connection
pub struct ConnectionHandle {
    /// Channel sender feeding this connection's writer task
    pub sender: OutboundSender,
    /// Current lifecycle state
    pub state: ConnectionState,
}

impl ConnectionHandle {
    pub fn new(sender: OutboundSender) -> Self {
        Self {
            sender,
            state: ConnectionState::Connecting,
        }
    }

    /// Queue a frame for this connection.
    ///
    /// Fails only when the writer task is gone, i.e. the socket is already dead.
    pub fn send(&self, frame: &OutboundFrame) -> Result<(), DeliveryError> {
        self.sender
            .send(Arc::clone(frame))
            .map_err(|_| DeliveryError::QueueClosed)
    }
}

/// Why a single recipient could not be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbound queue closed")]
    QueueClosed,
}
