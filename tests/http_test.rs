use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use bookloom::http::router;
use bookloom::{GraphManager, GraphSnapshot, MemoryStorage, PersistenceResult, SnapshotStorage};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Storage whose saves block until the test opens the gate
struct GatedStorage {
    gate: Mutex<mpsc::Receiver<()>>,
    opened_before_save: AtomicBool,
}

impl SnapshotStorage for GatedStorage {
    fn load(&self) -> PersistenceResult<GraphSnapshot> {
        Ok(GraphSnapshot::empty())
    }

    fn save(&self, _snapshot: &GraphSnapshot) -> PersistenceResult<()> {
        let gate = self.gate.lock().unwrap();
        let opened = gate.recv_timeout(Duration::from_secs(5)).is_ok();
        self.opened_before_save.store(opened, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "gated".to_string()
    }
}

fn app() -> Router {
    router(Arc::new(GraphManager::open(MemoryStorage::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health/check", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "200 OK"}));
}

#[tokio::test]
async fn test_status_reports_counts() {
    let app = app();
    send(&app, Method::POST, "/graph/add_node", Some(json!({"label": "book", "properties": {}}))).await;

    let (status, body) = send(&app, Method::GET, "/health/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], json!(bookloom::VERSION));
    assert_eq!(body["storage"]["nodes"], json!(1));
    assert_eq!(body["storage"]["edges"], json!(0));
}

#[tokio::test]
async fn test_node_lifecycle() {
    let app = app();

    let (status, node) = send(
        &app,
        Method::POST,
        "/graph/add_node",
        Some(json!({"label": "book", "properties": {"title": "Solaris"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(node, json!({"id": "1", "label": "book", "properties": {"title": "Solaris"}}));

    let (status, body) = send(
        &app,
        Method::PUT,
        "/graph/change_node/1",
        Some(json!({"label": "novel", "properties": {"title": "Solaris", "year": 1961}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Node changed successfully"}));

    let (_, graph) = send(&app, Method::GET, "/graph/show_graph", None).await;
    assert_eq!(
        graph,
        json!({
            "nodes": [{"id": "1", "label": "novel", "properties": {"title": "Solaris", "year": 1961}}],
            "edges": []
        })
    );

    let (status, body) = send(&app, Method::DELETE, "/graph/remove_node/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Node removed successfully"}));

    let (status, body) = send(&app, Method::DELETE, "/graph/remove_node/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Node not found"}));
}

#[tokio::test]
async fn test_change_missing_node() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/graph/change_node/17",
        Some(json!({"label": "book", "properties": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Node not found"}));
}

#[tokio::test]
async fn test_edge_lifecycle() {
    let app = app();
    for _ in 0..2 {
        send(&app, Method::POST, "/graph/add_node", Some(json!({"label": "book", "properties": {}}))).await;
    }

    // Weight defaults to 1.0
    let (status, edge) = send(
        &app,
        Method::POST,
        "/graph/add_edge",
        Some(json!({"source": "1", "target": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edge, json!({"source": "1", "target": "2", "weight": 1.0}));

    let (status, body) = send(&app, Method::DELETE, "/graph/remove_edge/1/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Edge removed successfully"}));

    let (status, body) = send(&app, Method::DELETE, "/graph/remove_edge/1/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Edge not found"}));
}

#[tokio::test]
async fn test_add_edge_with_missing_endpoint() {
    let app = app();
    send(&app, Method::POST, "/graph/add_node", Some(json!({"label": "book", "properties": {}}))).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/graph/add_edge",
        Some(json!({"source": "1", "target": "9", "weight": 0.5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains('9'));
}

#[tokio::test]
async fn test_remove_node_cascades_over_http() {
    let app = app();
    for _ in 0..3 {
        send(&app, Method::POST, "/graph/add_node", Some(json!({"label": "book", "properties": {}}))).await;
    }
    for (s, t) in [("1", "2"), ("2", "3"), ("3", "1")] {
        send(&app, Method::POST, "/graph/add_edge", Some(json!({"source": s, "target": t}))).await;
    }

    send(&app, Method::DELETE, "/graph/remove_node/2", None).await;

    let (_, graph) = send(&app, Method::GET, "/graph/show_graph", None).await;
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(graph["edges"], json!([{"source": "3", "target": "1", "weight": 1.0}]));
}

#[tokio::test]
async fn test_add_book_to_graph() {
    let app = app();
    let book = json!({
        "author": "Stanisław Lem",
        "title": "Solaris",
        "code": "gb-solaris",
        "published": "1961",
        "subjects": ["Fiction", "Science Fiction"]
    });

    let (status, first) = send(&app, Method::POST, "/books/add_to_graph", Some(book.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], json!("1"));
    assert_eq!(first["label"], json!("book"));
    assert_eq!(first["properties"]["code"], json!("gb-solaris"));
    assert_eq!(first["properties"]["isbn"], Value::Null);

    let (status, second) = send(&app, Method::POST, "/books/add_to_graph", Some(book)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);

    let (_, graph) = send(&app, Method::GET, "/graph/show_graph", None).await;
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_book_requires_code_and_title() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/add_to_graph",
        Some(json!({"author": "A", "title": "T", "code": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"detail": "Book code is required"}));

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/add_to_graph",
        Some(json!({"author": "A", "title": "  ", "code": "c"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"detail": "Book title is required"}));

    let (_, graph) = send(&app, Method::GET, "/graph/show_graph", None).await;
    assert_eq!(graph["nodes"], json!([]));
}

// Single-threaded runtime: a save running on the async worker would stall
// every other request until it finished.
#[tokio::test(flavor = "current_thread")]
async fn test_slow_save_does_not_block_other_requests() {
    let (open_gate, gate) = mpsc::channel();
    let storage = Arc::new(GatedStorage {
        gate: Mutex::new(gate),
        opened_before_save: AtomicBool::new(false),
    });
    let app = router(Arc::new(GraphManager::open(Arc::clone(&storage))));

    let writer = {
        let app = app.clone();
        tokio::spawn(async move {
            send(&app, Method::POST, "/graph/add_node", Some(json!({"label": "book", "properties": {}}))).await
        })
    };

    // Wait for the node to appear while its save is still held at the gate
    let mut nodes = json!(0);
    for _ in 0..100 {
        let (status, body) = send(&app, Method::GET, "/health/status", None).await;
        assert_eq!(status, StatusCode::OK);
        nodes = body["storage"]["nodes"].clone();
        if nodes == json!(1) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(nodes, json!(1));

    open_gate.send(()).unwrap();
    let (status, node) = writer.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(node["id"], json!("1"));
    assert!(storage.opened_before_save.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_add_edge_rejects_non_finite_weight() {
    let app = app();
    for _ in 0..2 {
        send(&app, Method::POST, "/graph/add_node", Some(json!({"label": "book", "properties": {}}))).await;
    }

    // JSON cannot carry NaN, but it can carry a number too large for f64
    let request = Request::builder()
        .method(Method::POST)
        .uri("/graph/add_edge")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"source": "1", "target": "2", "weight": 1e400}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());

    let (_, graph) = send(&app, Method::GET, "/graph/show_graph", None).await;
    assert_eq!(graph["edges"], json!([]));
}
