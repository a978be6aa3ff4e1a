//! HTTP handlers for the book graph API

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::graph::{Edge, GraphSnapshot, Node, NodeId, PropertyMap, DEFAULT_EDGE_WEIGHT};
use crate::manager::{BookEntry, GraphManager};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Errors returned to HTTP clients as `{"detail": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Body of add_node and change_node
#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    pub label: String,
    pub properties: PropertyMap,
}

fn default_weight() -> f64 {
    DEFAULT_EDGE_WEIGHT
}

/// Body of add_edge
#[derive(Debug, Deserialize)]
pub struct AddEdgeRequest {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Success body for mutations without a payload
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Run a manager call on the blocking pool.
///
/// Manager calls take std locks and mutations write the snapshot file, so
/// they stay off the async workers.
async fn with_manager<T, F>(manager: Arc<GraphManager>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&GraphManager) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&manager))
        .await
        .map_err(|e| {
            error!("Graph task failed: {}", e);
            ApiError::Internal(e.to_string())
        })
}

pub async fn show_graph(
    State(manager): State<Arc<GraphManager>>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    with_manager(manager, |m| m.show_graph()).await.map(Json)
}

pub async fn add_node(
    State(manager): State<Arc<GraphManager>>,
    Json(request): Json<NodeRequest>,
) -> Result<Json<Node>, ApiError> {
    let NodeRequest { label, properties } = request;
    with_manager(manager, move |m| m.add_node(label, properties))
        .await
        .map(Json)
}

pub async fn remove_node(
    State(manager): State<Arc<GraphManager>>,
    Path(node_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = NodeId::new(node_id);
    let target = id.clone();
    if !with_manager(manager, move |m| m.remove_node(&target)).await? {
        warn!("Node {} not found", id);
        return Err(ApiError::NotFound("Node not found"));
    }
    Ok(MessageResponse::new("Node removed successfully"))
}

pub async fn change_node(
    State(manager): State<Arc<GraphManager>>,
    Path(node_id): Path<String>,
    Json(request): Json<NodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = NodeId::new(node_id);
    let target = id.clone();
    let NodeRequest { label, properties } = request;
    if !with_manager(manager, move |m| m.change_node(&target, label, properties)).await? {
        warn!("Node {} not found", id);
        return Err(ApiError::NotFound("Node not found"));
    }
    Ok(MessageResponse::new("Node changed successfully"))
}

pub async fn add_edge(
    State(manager): State<Arc<GraphManager>>,
    Json(request): Json<AddEdgeRequest>,
) -> Result<Json<Edge>, ApiError> {
    let AddEdgeRequest { source, target, weight } = request;
    with_manager(manager, move |m| m.add_edge(source, target, weight))
        .await?
        .map(Json)
        .map_err(|e| {
            warn!("Failed to add edge: {}", e);
            ApiError::BadRequest(e.to_string())
        })
}

pub async fn remove_edge(
    State(manager): State<Arc<GraphManager>>,
    Path((source_id, target_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let source = NodeId::new(source_id);
    let target = NodeId::new(target_id);
    let (s, t) = (source.clone(), target.clone());
    if !with_manager(manager, move |m| m.remove_edge(&s, &t)).await? {
        warn!("Edge {} -> {} not found", source, target);
        return Err(ApiError::NotFound("Edge not found"));
    }
    Ok(MessageResponse::new("Edge removed successfully"))
}

/// Add a book from search results, or return the node already holding it
pub async fn add_book_to_graph(
    State(manager): State<Arc<GraphManager>>,
    Json(book): Json<BookEntry>,
) -> Result<Json<Node>, ApiError> {
    if book.code.trim().is_empty() {
        return Err(ApiError::Unprocessable("Book code is required"));
    }
    if book.title.trim().is_empty() {
        return Err(ApiError::Unprocessable("Book title is required"));
    }
    with_manager(manager, move |m| m.add_book(book)).await.map(Json)
}

pub async fn health_check() -> Json<serde_json::Value> {
    debug!("Health check");
    Json(json!({ "status": "200 OK" }))
}

/// Handler for system status
pub async fn status_handler(
    State(manager): State<Arc<GraphManager>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (nodes, edges) = with_manager(manager, |m| (m.node_count(), m.edge_count())).await?;
    Ok(Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "storage": {
            "nodes": nodes,
            "edges": edges,
        }
    })))
}
