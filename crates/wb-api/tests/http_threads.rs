use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wb_api::{create_router, AppState};
use wb_core::{ConnectionMode, Thread, Threads};
use wb_hub::testing::memory_transport;
use wb_hub::{Hub, HubConfig};
use wb_store_memory::MemoryStore;

const LOCAL_ORIGIN: &str = "http://localhost:3000";

fn app() -> (Router, Hub) {
    let hub = Hub::new(Arc::new(MemoryStore::new()), HubConfig::default());
    hub.start_workers().unwrap();
    let state = AppState::new(hub.clone(), vec![LOCAL_ORIGIN.to_string()]);
    (create_router(state), hub)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_thread(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/thread")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn thread_json(content: &str, user: &str) -> String {
    serde_json::to_string(&Thread::new(content, user)).unwrap()
}

#[tokio::test]
async fn home_says_hello() {
    let (app, _hub) = app();
    assert_eq!(send(&app, get("/")).await, (StatusCode::OK, "Hello!".to_string()));
}

#[tokio::test]
async fn posted_threads_get_sequential_ids_and_are_listed() {
    let (app, _hub) = app();

    let (status, body) = send(&app, post_thread(thread_json("this is thread 1", "anna"))).await;
    assert_eq!(status, StatusCode::OK);
    let first: Thread = serde_json::from_str(&body).unwrap();
    assert_eq!(first.id, 0);

    let (_, body) = send(&app, post_thread(thread_json("this is thread 2", "bob"))).await;
    let second: Thread = serde_json::from_str(&body).unwrap();
    assert_eq!(second.id, 1);

    let (status, body) = send(&app, get("/thread")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Threads = serde_json::from_str(&body).unwrap();
    assert_eq!(listed, vec![first, second.clone()]);

    let (status, body) = send(&app, get("/thread/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Thread>(&body).unwrap(), second);
}

#[tokio::test]
async fn empty_history_lists_as_empty_array() {
    let (app, _hub) = app();
    assert_eq!(send(&app, get("/thread")).await, (StatusCode::OK, "[]".to_string()));
}

#[tokio::test]
async fn undecodable_payload_is_rejected() {
    let (app, _hub) = app();
    let (status, body) = send(&app, post_thread("{\"Content\": ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Unable to decode payload");
}

#[tokio::test]
async fn invalid_threads_are_rejected_with_their_reason() {
    let (app, hub) = app();

    let (status, body) = send(&app, post_thread(thread_json("", "anna"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Thread content must have at least 1 character.");

    let (status, body) = send(&app, post_thread(thread_json("hello", ""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Thread is missing a user.");

    assert!(hub.threads().await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_ids_and_missing_threads() {
    let (app, _hub) = app();

    for bad in ["/thread/abc", "/thread/-1", "/thread/1.5"] {
        assert_eq!(
            send(&app, get(bad)).await,
            (StatusCode::BAD_REQUEST, "Invalid ID provided".to_string()),
            "{bad}"
        );
    }

    assert_eq!(
        send(&app, get("/thread/5")).await,
        (
            StatusCode::NOT_FOUND,
            "The thread you are looking for does not exists.".to_string()
        )
    );
}

#[tokio::test]
async fn cors_header_only_for_allowed_origins() {
    let (app, _hub) = app();

    let allowed = Request::builder()
        .uri("/thread")
        .header(header::ORIGIN, LOCAL_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        LOCAL_ORIGIN
    );

    let foreign = Request::builder()
        .uri("/thread")
        .header(header::ORIGIN, "http://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(foreign).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn http_post_reaches_live_viewers() {
    let (app, hub) = app();
    let (sink, stream, mut viewer) = memory_transport();
    hub.register_connection(Arc::new(sink), Box::new(stream), ConnectionMode::Broadcast)
        .await
        .unwrap();
    viewer.recv_timeout(Duration::from_secs(2)).await.unwrap();

    send(&app, post_thread(thread_json("over http", "anna"))).await;

    let frame = viewer.recv_timeout(Duration::from_secs(2)).await.unwrap();
    let history: Threads = serde_json::from_slice(&frame).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "over http");
}

#[tokio::test]
async fn posting_after_shutdown_is_unavailable() {
    let (app, hub) = app();
    hub.shutdown().await;

    let (status, _) = send(&app, post_thread(thread_json("too late", "anna"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
