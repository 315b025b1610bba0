//! # Relay
//!
//! A minimal real-time relay: JSON messages sent by one WebSocket client are
//! forwarded to every other connected client, and a small static front-end is
//! served from the same port.
//!
//! ## Modules
//!
//! - [`websocket`]: Connection registry, payload validation and fan-out
//! - [`static_files`]: Path-to-file lookup for plain HTTP requests
//! - [`server`]: Axum router, listener and graceful shutdown
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     serve(AppState::from_config(&config), &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod server;
pub mod static_files;
pub mod websocket;

// Re-export top-level types for convenience
pub use config::{Config, ConfigError, HubSettings, LogFormat, LoggingConfig, ServerConfig};

pub use server::{build_router, serve, serve_with_shutdown, AppState, ServerError, ServerResult};

pub use static_files::{StaticError, StaticFile, StaticResponder};

pub use websocket::{
    ConnectionHub, ConnectionId, ConnectionState, FanOut, HubConfig, HubError, PayloadError,
    Relay,
};
