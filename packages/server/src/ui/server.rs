//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tabiji_shared::protocol::{CONVERSATIONS_PATH, MESSAGES_PATH_PREFIX, SOCKET_PATH};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{get_conversations, get_history, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Development chat backend
///
/// # Example
///
/// ```ignore
/// let server = Server::new(AppState::in_memory(seeds));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Routes of the backend
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route(SOCKET_PATH, get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route(CONVERSATIONS_PATH, get(get_conversations))
            .route(
                &format!("{}/{{counterpart_id}}", MESSAGES_PATH_PREFIX),
                get(get_history),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat backend listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}{}?token=<token>", bind_addr, SOCKET_PATH);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
