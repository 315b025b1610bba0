//! Route Handlers
//!
//! There is a single entry point: upgrade requests go to the hub, on any
//! path, and everything else goes to the static responder.

pub mod static_files;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::Uri,
    response::Response,
};
use std::sync::Arc;

use crate::server::state::AppState;
use crate::websocket;

/// Route a request to the hub or the static responder
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    ws: Option<WebSocketUpgrade>,
    uri: Uri,
) -> Response {
    match ws {
        Some(ws) => websocket::upgrade(ws, Arc::clone(&state.hub)),
        None => static_files::serve_static(&state, uri.path()).await,
    }
}
