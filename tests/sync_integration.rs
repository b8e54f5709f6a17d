//! ThreadSync against an in-process fake backend.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use pawzzle_client::api::{ApiClient, ApiError};
use pawzzle_client::chat::{AdoptionStatus, ChatStore, EnsureThread, Sender};
use pawzzle_client::session::{AuthSession, SessionUser};
use pawzzle_client::{ClientConfig, SessionStore, ThreadSync};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Backend {
    next_message: u64,
    messages: Vec<Value>,
    adoption: Option<&'static str>,
}

type Shared = Arc<Mutex<Backend>>;

fn thread_json(id: &str, backend: &Backend) -> Value {
    let mut thread = json!({
        "id": id,
        "ownerId": 9,
        "ownerName": "Shelter",
        "petId": "3",
        "petName": "Milo",
        "messages": backend.messages,
        "viewerRole": "ADOPTER",
    });
    if let Some(status) = backend.adoption {
        thread["adoption"] = json!({ "id": "a-1", "status": status });
    }
    thread
}

async fn list_threads() -> Json<Value> {
    Json(json!([
        { "id": "2", "ownerId": 2, "ownerName": "Bo" },
        { "id": "1", "ownerId": 1, "ownerName": "Ana" },
        { "id": "2", "ownerId": 2, "ownerName": "Bo duplicate" },
    ]))
}

async fn get_thread(State(state): State<Shared>, Path(id): Path<String>) -> impl IntoResponse {
    if id == "slow" {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    let backend = state.lock().await;
    Json(thread_json(&id, &backend))
}

async fn create_thread(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["ownerId"] != 9 || body["petId"] != 3 {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "参数错误" })));
    }
    let backend = state.lock().await;
    (StatusCode::OK, Json(thread_json("t-9", &backend)))
}

async fn send_message(
    State(state): State<Shared>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let text = body["text"].as_str().unwrap_or_default().to_string();
    if text.starts_with("slow") {
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    let mut backend = state.lock().await;
    backend.next_message += 1;
    let message = json!({
        "id": format!("m-{}", backend.next_message),
        "sender": "user",
        "text": text,
        "createdAt": 1_700_000_000_000_i64 + i64::try_from(backend.next_message).unwrap(),
    });
    backend.messages.push(message.clone());
    Json(message)
}

async fn request_adoption(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    let mut backend = state.lock().await;
    backend.adoption = Some("APPLY");
    Json(thread_json(&id, &backend))
}

async fn accept_adoption(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    let mut backend = state.lock().await;
    backend.adoption = Some("SCREENING");
    Json(thread_json(&id, &backend))
}

async fn setup() -> ThreadSync {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/api/threads", get(list_threads).post(create_thread))
        .route("/api/threads/{id}", get(get_thread))
        .route("/api/threads/{id}/messages", post(send_message))
        .route("/api/threads/{id}/adoption", post(request_adoption))
        .route("/api/threads/{id}/adoption/accept", post(accept_adoption))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let session = SessionStore::new();
    session.set_session(Some(AuthSession {
        token: "tok-1".to_string(),
        user: SessionUser {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            user_type: None,
            user_intent: None,
        },
    }));
    let client = ApiClient::new(&ClientConfig::with_base_url(format!("http://{addr}")), session)
        .unwrap();
    ThreadSync::new(client, ChatStore::new())
}

#[tokio::test]
async fn test_refresh_keeps_server_order() {
    let sync = setup().await;
    sync.store().ensure_thread(EnsureThread::new(5, "Local only"));

    let threads = sync.refresh(&CancellationToken::new()).await.unwrap();
    let ids: Vec<_> = threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["2", "1", "5"]);
    assert_eq!(sync.store().thread("5").unwrap().counterpart_name, "Local only");
}

#[tokio::test]
async fn test_start_send_and_adopt() {
    let sync = setup().await;
    let cancel = CancellationToken::new();

    let thread = sync.start(9, 3, &cancel).await.unwrap().unwrap();
    assert_eq!(thread.id, "t-9");
    assert_eq!(thread.subject_name.as_deref(), Some("Milo"));

    let sent = sync.send("t-9", "  hello  ", &cancel).await.unwrap().unwrap();
    assert_eq!(sent.text, "hello");
    assert_eq!(sent.sender, Sender::User);
    assert_eq!(sync.store().thread("t-9").unwrap().messages, vec![sent]);

    let thread = sync.request_adoption("t-9", &cancel).await.unwrap().unwrap();
    assert_eq!(thread.adoption.unwrap().status, AdoptionStatus::Apply);

    sync.accept_adoption("t-9", &cancel).await.unwrap();
    let stored = sync.store().thread("t-9").unwrap();
    assert_eq!(stored.adoption.unwrap().status, AdoptionStatus::Screening);
    assert_eq!(stored.messages.len(), 1);
}

#[tokio::test]
async fn test_rapid_sends_append_in_call_order() {
    let sync = setup().await;
    let cancel = CancellationToken::new();
    sync.start(9, 3, &cancel).await.unwrap();

    let (first, second) = tokio::join!(
        sync.send("t-9", "slow first", &cancel),
        sync.send("t-9", "second", &cancel),
    );
    first.unwrap();
    second.unwrap();

    let texts: Vec<_> = sync
        .store()
        .thread("t-9")
        .unwrap()
        .messages
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, ["slow first", "second"]);
}

#[tokio::test]
async fn test_send_to_unmirrored_thread_fetches_it() {
    let sync = setup().await;

    let sent = sync
        .send("t-9", "hi", &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    let stored = sync.store().thread("t-9").unwrap();
    assert_eq!(stored.messages.last(), Some(&sent));
}

#[tokio::test]
async fn test_cancelled_open_leaves_store_untouched() {
    let sync = setup().await;
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let err = sync.open("slow", &cancel).await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
    assert!(sync.store().is_empty());
}

#[tokio::test]
async fn test_server_error_surfaces() {
    let sync = setup().await;
    let err = sync
        .start(1, 1, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(sync.store().is_empty());
}

#[tokio::test]
async fn test_open_thread_id_with_reserved_characters() {
    let sync = setup().await;

    let opened = sync
        .open("3:a/../b?x=1", &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(opened.id, "3:a/../b?x=1");
    assert!(sync.store().thread("3:a/../b?x=1").is_some());
}
