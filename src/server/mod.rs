//! Relay HTTP Server
//!
//! One listener, two kinds of traffic, built with Axum.
//!
//! # Routing
//!
//! - WebSocket upgrade request, any path: joins the broadcast hub
//! - Any other request: served by the static responder
//!   - `/` serves the index document
//!   - `/<path>` serves `<static_root>/<path>`
//!   - missing files get `404 Not found`
//!
//! # Example
//!
//! ```rust,no_run
//! use relay::config::Config;
//! use relay::server::{serve, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let state = AppState::from_config(&config);
//!     serve(state, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use state::AppState;

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Build the router: every request goes through the dispatcher
pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .fallback(routes::dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Bind the listening socket for `config`
pub async fn bind(config: &ServerConfig) -> ServerResult<TcpListener> {
    let addr = config.addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Start the server and run until Ctrl+C or SIGTERM
pub async fn serve(state: AppState, config: &ServerConfig) -> ServerResult<()> {
    let listener = bind(config).await?;
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Run the server on an already bound listener until `signal` resolves
///
/// When the signal fires the hub is shut down first, which closes every
/// WebSocket, then the HTTP side drains.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    signal: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr()?;
    let hub = Arc::clone(&state.hub);
    let router = build_router(state);

    tracing::info!("Server running on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            hub.shutdown().await;
        })
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
