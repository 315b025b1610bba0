//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;

use crate::config::Config;
use crate::static_files::StaticResponder;
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// WebSocket connection hub
    pub hub: Arc<ConnectionHub>,
    /// Static file lookup for plain requests
    pub static_files: Arc<StaticResponder>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(hub_config: HubConfig, static_files: StaticResponder) -> Self {
        Self {
            hub: Arc::new(ConnectionHub::new(hub_config)),
            static_files: Arc::new(static_files),
        }
    }

    /// Build state from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            HubConfig::from(&config.hub),
            StaticResponder::new(
                config.server.static_root.clone(),
                config.server.index_document.clone(),
            ),
        )
    }

    /// Get WebSocket connection count
    pub async fn connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}
