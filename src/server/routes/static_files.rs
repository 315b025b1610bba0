//! Static File Route
//!
//! Plain requests of any method and path land here.

use axum::response::{IntoResponse, Response};

use crate::server::state::AppState;

/// Serve the file for `path`, or a plain-text 404
pub async fn serve_static(state: &AppState, path: &str) -> Response {
    tracing::info!(path, "Request for file");

    match state.static_files.lookup(path).await {
        Ok(file) => file.into_response(),
        Err(e) => e.into_response(),
    }
}
