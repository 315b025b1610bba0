//! WebSocket Handler
//!
//! Completes the upgrade handshake and drives one connection: a writer task
//! drains the connection's outbound queue into the socket, a reader task
//! feeds inbound frames to the hub. Whichever ends first tears down the other.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::connection::{ConnectionId, ConnectionState, OutboundFrame};
use super::hub::ConnectionHub;

/// Upgrade an HTTP request into a hub connection
pub fn upgrade(ws: WebSocketUpgrade, hub: Arc<ConnectionHub>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundFrame>();

    let connection_id = match hub.on_connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected WebSocket connection");
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    // Task to forward queued frames to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.to_string())).await.is_err() {
                tracing::debug!(
                    connection_id = %connection_id,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
        // Queue closed by hub shutdown: say goodbye properly
        let _ = sender.send(Message::Close(None)).await;
    });

    let hub_for_recv = Arc::clone(&hub);

    // Task to receive frames from the socket and relay them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, connection_id, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.on_disconnect(connection_id).await;
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &ConnectionHub,
    connection_id: ConnectionId,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            hub.on_message(connection_id, &text).await;
            true
        }
        // Binary frames are read as text; invalid UTF-8 becomes U+FFFD
        Message::Binary(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            hub.on_message(connection_id, &text).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            hub.set_state(connection_id, ConnectionState::Closing).await;
            false
        }
    }
}
