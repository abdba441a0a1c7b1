//! End-to-end tests for the HTTP API.
//!
//! Each test builds the full router over a private in-memory database and
//! drives it with `tower::ServiceExt::oneshot`.

use asset_vault::{
    api::{router, AppState},
    assets::SqliteAssetStore,
    auth::{AuthService, PasswordHasher, SqliteAuthStore},
    clock::ManualClock,
    db::Database,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, SubsecRound, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const MAX_UPLOAD: usize = 4096;

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::in_memory().expect("in-memory db");
        let auth_store = SqliteAuthStore::new(db.clone());
        let clock = Arc::new(ManualClock::new(Utc::now().trunc_subsecs(0)));
        let auth = AuthService::new(
            Arc::new(auth_store.clone()),
            Arc::new(auth_store),
            Arc::new(PasswordHasher::new(4)),
        )
        .with_clock(clock.clone());

        auth.create_user("alice", "correct-pw").await.unwrap();
        auth.create_user("bob", "bob-pw").await.unwrap();

        let state = AppState {
            auth,
            assets: Arc::new(SqliteAssetStore::new(db)),
        };

        Self {
            router: router(state, MAX_UPLOAD),
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self, login: &str, password: &str) -> Response {
        let body = serde_json::json!({ "login": login, "password": password }).to_string();
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn token(&self, login: &str, password: &str) -> String {
        let response = self.login(login, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn authed(&self, method: Method, uri: &str, token: &str, body: Vec<u8>) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, token: &str, name: &str, data: &[u8]) -> Response {
        self.authed(
            Method::POST,
            &format!("/api/upload-asset/{name}"),
            token,
            data.to_vec(),
        )
        .await
    }

    async fn fetch(&self, token: &str, name: &str) -> Response {
        self.authed(Method::GET, &format!("/api/asset/{name}"), token, Vec::new())
            .await
    }

    async fn delete(&self, token: &str, name: &str) -> Response {
        self.authed(Method::DELETE, &format!("/api/asset/{name}"), token, Vec::new())
            .await
    }

    async fn list(&self, token: &str) -> Response {
        self.authed(Method::GET, "/api/assets", token, Vec::new())
            .await
    }
}

async fn raw_body(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body(response: Response) -> Value {
    serde_json::from_slice(&raw_body(response).await).unwrap()
}

#[tokio::test]
async fn relogin_invalidates_previous_token() {
    let app = TestApp::new().await;

    let t1 = app.token("alice", "correct-pw").await;
    let response = app.upload(&t1, "report.txt", b"hello").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");

    let response = app.fetch(&t1, "report.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(raw_body(response).await, b"hello");

    let t2 = app.token("alice", "correct-pw").await;
    assert_ne!(t1, t2);

    let response = app.fetch(&t1, "report.txt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.fetch(&t2, "report.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(raw_body(response).await, b"hello");
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = TestApp::new().await;

    let wrong_pw = app.login("alice", "wrong").await;
    let unknown = app.login("nobody", "wrong").await;

    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(raw_body(wrong_pw).await, raw_body(unknown).await);
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"login": 42"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_accepts_json_without_content_type() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth")
                .body(Body::from(r#"{"login":"alice","password":"correct-pw"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let token = json_body(response).await["token"].as_str().unwrap().to_string();
    assert_eq!(app.list(&token).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_method_gets_json_error() {
    let app = TestApp::new().await;
    let response = app
        .send(Request::builder().uri("/api/auth").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await["error"], "method not allowed");
}

#[tokio::test]
async fn tenant_isolation() {
    let app = TestApp::new().await;
    let alice = app.token("alice", "correct-pw").await;
    let bob = app.token("bob", "bob-pw").await;

    app.upload(&alice, "secret.txt", b"alice only").await;

    assert_eq!(app.fetch(&bob, "secret.txt").await.status(), StatusCode::NOT_FOUND);

    let listing = json_body(app.list(&bob).await).await;
    assert_eq!(listing["assets"].as_array().unwrap().len(), 0);

    // Deleting someone else's asset is a no-op for the owner
    assert_eq!(app.delete(&bob, "secret.txt").await.status(), StatusCode::OK);
    let response = app.fetch(&alice, "secret.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(raw_body(response).await, b"alice only");

    // Same name, different owner, independent data
    app.upload(&bob, "secret.txt", b"bob's").await;
    assert_eq!(raw_body(app.fetch(&alice, "secret.txt").await).await, b"alice only");
    assert_eq!(raw_body(app.fetch(&bob, "secret.txt").await).await, b"bob's");
}

#[tokio::test]
async fn list_returns_metadata_without_data() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    app.upload(&token, "a.txt", b"aaa").await;
    app.upload(&token, "b.bin", &[0u8, 1, 2, 255]).await;

    let response = app.list(&token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = json_body(response).await;
    let assets = listing["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 2);

    let mut names: Vec<&str> = assets.iter().map(|a| a["name"].as_str().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "b.bin"]);

    for asset in assets {
        assert!(asset.get("owner").is_some());
        assert!(asset.get("created_at").is_some());
        assert!(asset.get("data").is_none());
    }
}

#[tokio::test]
async fn delete_then_fetch_is_not_found() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    app.upload(&token, "tmp.txt", b"x").await;
    let response = app.delete(&token, "tmp.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");

    let response = app.fetch(&token, "tmp.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "not found");
}

#[tokio::test]
async fn reupload_overwrites() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    app.upload(&token, "doc.txt", b"v1").await;
    app.upload(&token, "doc.txt", b"v2").await;

    assert_eq!(raw_body(app.fetch(&token, "doc.txt").await).await, b"v2");
    let listing = json_body(app.list(&token).await).await;
    assert_eq!(listing["assets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_authorization_headers_are_rejected() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    for value in [
        token.clone(),
        format!("bearer {token}"),
        format!("Basic {token}"),
        "Bearer ".to_string(),
    ] {
        let response = app
            .send(
                Request::builder()
                    .uri("/api/assets")
                    .header(header::AUTHORIZATION, value.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value:?}");
        assert_eq!(json_body(response).await["error"], "unauthorized");
    }
}

#[tokio::test]
async fn expired_and_unknown_tokens_look_the_same() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    app.clock.advance(Duration::hours(24) - Duration::seconds(1));
    assert_eq!(app.list(&token).await.status(), StatusCode::OK);

    app.clock.advance(Duration::seconds(2));
    let expired = app.list(&token).await;
    let unknown = app.list("00ff00ff").await;

    assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(raw_body(expired).await, raw_body(unknown).await);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    let response = app.upload(&token, "big.bin", &vec![7u8; MAX_UPLOAD + 1]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.fetch(&token, "big.bin").await.status(), StatusCode::NOT_FOUND);

    let response = app.upload(&token, "fits.bin", &vec![7u8; MAX_UPLOAD]).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_name_is_bad_request() {
    let app = TestApp::new().await;
    let token = app.token("alice", "correct-pw").await;

    let response = app
        .authed(Method::POST, "/api/upload-asset/", &token, b"data".to_vec())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_needs_no_auth() {
    let app = TestApp::new().await;
    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
