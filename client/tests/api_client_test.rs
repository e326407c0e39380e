//! Retry-once and session handling against a scripted transport

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

use cn_client::{
    ApiClient, ApiRequest, ApiResponse, ClientError, ClientResult, HttpTransport, MemoryTokenStorage,
    RefreshTokenStorage, SessionStore,
};
use cn_core::domain::entities::token::RefreshToken;

/// Answers requests from a queue and records what was sent
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<ClientResult<ApiResponse>>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn with(responses: Vec<ClientResult<ApiResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().clone()
    }

    fn paths(&self) -> Vec<String> {
        self.sent().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.sent.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".to_string())))
    }
}

fn session_body(access: &str, refresh: &str) -> String {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "user": {
            "id": Uuid::new_v4(),
            "name": "Ada",
            "email": "a@x.com",
            "avatar_url": null
        }
    })
    .to_string()
}

fn ok(body: impl Into<String>) -> ClientResult<ApiResponse> {
    Ok(ApiResponse::new(200, body))
}

fn unauthorized(code: &str) -> ClientResult<ApiResponse> {
    Ok(ApiResponse::new(
        401,
        json!({ "error": code, "message": "rejected", "timestamp": "2024-01-01T00:00:00Z" }).to_string(),
    ))
}

fn client_with(
    responses: Vec<ClientResult<ApiResponse>>,
    stored: Option<&str>,
) -> (ApiClient<ScriptedTransport>, Arc<MemoryTokenStorage>) {
    let storage = Arc::new(match stored {
        Some(token) => MemoryTokenStorage::with_token(RefreshToken::new(token)),
        None => MemoryTokenStorage::new(),
    });
    let client = ApiClient::new(
        ScriptedTransport::with(responses),
        SessionStore::new(storage.clone()),
    );
    (client, storage)
}

#[tokio::test]
async fn test_login_stores_session() {
    let (client, storage) = client_with(vec![ok(session_body("a1", "r1"))], None);

    let user = client.login("a@x.com", "secret1").await.unwrap();

    assert_eq!(user.email, "a@x.com");
    assert_eq!(client.current_user(), Some(user));
    assert_eq!(client.session().access_token().unwrap().as_str(), "a1");
    assert_eq!(storage.load().unwrap().unwrap().as_str(), "r1");
}

#[tokio::test]
async fn test_failed_login_stores_nothing() {
    let (client, storage) = client_with(
        vec![Ok(ApiResponse::new(
            400,
            json!({ "error": "invalid_credentials", "message": "Invalid email or password", "timestamp": "2024-01-01T00:00:00Z" }).to_string(),
        ))],
        None,
    );

    let error = client.login("a@x.com", "wrong").await.unwrap_err();

    assert_eq!(error.error_code().as_deref(), Some("invalid_credentials"));
    assert!(!client.session().is_authenticated());
    assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn test_401_refreshes_and_replays_once() {
    let (client, storage) = client_with(
        vec![
            ok(session_body("a1", "r1")),
            unauthorized("unauthenticated"),
            ok(session_body("a2", "r2")),
            ok("[]"),
        ],
        None,
    );
    client.login("a@x.com", "secret1").await.unwrap();

    let feed = client.feed().await.unwrap();

    assert!(feed.is_empty());
    assert_eq!(
        client.transport().paths(),
        vec!["/api/auth/login", "/api/posts", "/api/auth/refresh", "/api/posts"]
    );

    let sent = client.transport().sent();
    assert_eq!(sent[1].bearer.as_ref().unwrap().as_str(), "a1");
    assert_eq!(sent[2].body.as_ref().unwrap()["refresh_token"], "r1");
    assert!(sent[2].bearer.is_none());
    assert_eq!(sent[3].bearer.as_ref().unwrap().as_str(), "a2");
    assert_eq!(storage.load().unwrap().unwrap().as_str(), "r2");
}

#[tokio::test]
async fn test_second_401_is_not_retried() {
    let (client, _) = client_with(
        vec![
            ok(session_body("a1", "r1")),
            unauthorized("unauthenticated"),
            ok(session_body("a2", "r2")),
            unauthorized("unauthenticated"),
        ],
        None,
    );
    client.login("a@x.com", "secret1").await.unwrap();

    let error = client.feed().await.unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(client.transport().sent().len(), 4);
}

#[tokio::test]
async fn test_failed_refresh_clears_session_and_returns_original_error() {
    let (client, storage) = client_with(
        vec![
            ok(session_body("a1", "r1")),
            unauthorized("unauthenticated"),
            unauthorized("invalid_session"),
        ],
        None,
    );
    client.login("a@x.com", "secret1").await.unwrap();

    let error = client.me().await.unwrap_err();

    assert_eq!(error.error_code().as_deref(), Some("unauthenticated"));
    assert!(!client.session().is_authenticated());
    assert!(storage.load().unwrap().is_none());
    assert_eq!(client.transport().sent().len(), 3);
}

#[tokio::test]
async fn test_unauthenticated_without_session_skips_refresh() {
    let (client, _) = client_with(vec![unauthorized("unauthenticated")], None);

    let error = client
        .create_post("hello", &[])
        .await
        .unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(client.transport().paths(), vec!["/api/posts"]);
    assert!(client.transport().sent()[0].bearer.is_none());
}

#[tokio::test]
async fn test_restore_from_stored_refresh_token() {
    let (client, storage) = client_with(vec![ok(session_body("a2", "r2"))], Some("r1"));

    let user = client.restore().await.unwrap();

    assert_eq!(user.unwrap().name, "Ada");
    assert_eq!(client.session().access_token().unwrap().as_str(), "a2");
    assert_eq!(storage.load().unwrap().unwrap().as_str(), "r2");
}

#[tokio::test]
async fn test_restore_rejected_clears_storage() {
    let (client, storage) = client_with(vec![unauthorized("invalid_session")], Some("stale"));

    assert!(client.restore().await.unwrap().is_none());
    assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn test_restore_offline_keeps_token() {
    let (client, storage) = client_with(
        vec![Err(ClientError::Transport("connection refused".to_string()))],
        Some("r1"),
    );

    assert!(matches!(client.restore().await, Err(ClientError::Transport(_))));
    assert_eq!(storage.load().unwrap().unwrap().as_str(), "r1");
}

#[tokio::test]
async fn test_restore_without_token_sends_nothing() {
    let (client, _) = client_with(Vec::new(), None);

    assert!(client.restore().await.unwrap().is_none());
    assert!(client.transport().sent().is_empty());
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let (client, storage) = client_with(
        vec![
            ok(session_body("a1", "r1")),
            Err(ClientError::Transport("connection reset".to_string())),
        ],
        None,
    );
    client.login("a@x.com", "secret1").await.unwrap();

    client.logout().await.unwrap();

    let sent = client.transport().sent();
    assert_eq!(sent[1].path, "/api/auth/logout");
    assert_eq!(sent[1].body.as_ref().unwrap()["refresh_token"], "r1");
    assert!(!client.session().is_authenticated());
    assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn test_logout_everywhere() {
    let (client, storage) = client_with(
        vec![ok(session_body("a1", "r1")), ok(r#"{"message":"Logged out everywhere","revoked":3}"#)],
        None,
    );
    client.login("a@x.com", "secret1").await.unwrap();

    assert_eq!(client.logout_everywhere().await.unwrap(), 3);
    assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn test_toggle_like_decodes_likes() {
    let post_id = Uuid::new_v4();
    let liker = Uuid::new_v4();
    let body: Value = json!({ "post_id": post_id, "likes": [liker] });
    let (client, _) = client_with(vec![ok(session_body("a1", "r1")), ok(body.to_string())], None);
    client.login("a@x.com", "secret1").await.unwrap();

    let likes = client.toggle_like(post_id).await.unwrap();

    assert_eq!(likes.post_id, post_id);
    assert_eq!(likes.likes, vec![liker]);
    assert_eq!(
        client.transport().paths()[1],
        format!("/api/posts/{}/like", post_id)
    );
}
