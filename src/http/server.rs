//! HTTP server for the book graph API

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use crate::manager::GraphManager;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use super::handler;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the application router
pub fn router(manager: Arc<GraphManager>) -> Router {
    let graph = Router::new()
        .route("/show_graph", get(handler::show_graph))
        .route("/add_node", post(handler::add_node))
        .route("/remove_node/:node_id", delete(handler::remove_node))
        .route("/change_node/:node_id", put(handler::change_node))
        .route("/add_edge", post(handler::add_edge))
        .route("/remove_edge/:source_id/:target_id", delete(handler::remove_edge));

    let books = Router::new().route("/add_to_graph", post(handler::add_book_to_graph));

    let health = Router::new()
        .route("/check", get(handler::health_check))
        .route("/status", get(handler::status_handler));

    Router::new()
        .nest("/graph", graph)
        .nest("/books", books)
        .nest("/health", health)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(manager)
}

/// HTTP server exposing the graph manager
pub struct HttpServer {
    manager: Arc<GraphManager>,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(manager: Arc<GraphManager>, config: ServerConfig) -> Self {
        Self { manager, config }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.manager));

        let addr = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Book graph API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }
}
