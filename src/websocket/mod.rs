//! WebSocket Relay
//!
//! Relays JSON messages between connected clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Owns the registry of open connections and fans messages out
//! - **Handler**: Performs the upgrade and pumps frames between socket and hub
//! - **Payload**: Syntactic JSON validation of inbound frames
//!
//! ## Protocol
//!
//! Clients may upgrade on any path. Every text frame must be a JSON document.
//! Valid frames are forwarded unchanged to every other open connection;
//! invalid ones are dropped without telling anyone.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000');
//!
//! ws.onopen = () => ws.send(JSON.stringify({user: 'ada', text: 'hello'}));
//! ws.onmessage = (event) => console.log('Received:', JSON.parse(event.data));
//! ```

mod connection;
mod handler;
mod hub;
pub mod payload;

pub use connection::{
    ConnectionHandle, ConnectionId, ConnectionState, DeliveryError, OutboundFrame,
    OutboundSender,
};
pub use handler::upgrade;
pub use hub::{ConnectionHub, FanOut, HubConfig, HubError, Relay};
pub use payload::PayloadError;
