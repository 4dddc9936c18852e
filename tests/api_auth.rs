use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use hk_reception::{
    config::Config,
    models::user::{NewUser, User},
    repositories::{
        memory::MemoryUserStore,
        user::{StoreError, StoreResult, UserStore},
    },
    routes::build_router,
    state::AppState,
};

/// A memory store whose failures and disappearing users are switched on
/// from the test.
struct ControlledStore {
    inner: MemoryUserStore,
    requires_email: bool,
    failing: AtomicBool,
    users_vanished: AtomicBool,
    /// Lookups miss while inserts still see every record, as when two
    /// registrations race past the availability checks.
    lookups_stale: AtomicBool,
}

impl ControlledStore {
    fn new(requires_email: bool) -> Self {
        Self {
            inner: MemoryUserStore::new(),
            requires_email,
            failing: AtomicBool::new(false),
            users_vanished: AtomicBool::new(false),
            lookups_stale: AtomicBool::new(false),
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for ControlledStore {
    fn backend(&self) -> &'static str {
        "controlled"
    }

    fn requires_email(&self) -> bool {
        self.requires_email
    }

    async fn fetch_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.check()?;
        if self.users_vanished.load(Ordering::SeqCst) || self.lookups_stale.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.fetch_by_username(username).await
    }

    async fn fetch_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check()?;
        if self.lookups_stale.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.fetch_by_email(email).await
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<()> {
        self.check()?;
        self.inner.create(new_user).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    store: Arc<ControlledStore>,
    cookie: Option<String>,
}

impl TestApp {
    fn new(requires_email: bool) -> Self {
        let config = Config::from_lookup(|key| match key {
            "USER_STORE" => Some("memory".to_string()),
            "STATIC_DIR" => Some(concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string()),
            _ => None,
        })
        .unwrap();

        let store = Arc::new(ControlledStore::new(requires_email));
        let state = AppState::with_store(&config, store.clone());

        Self {
            router: build_router(state.clone()),
            state,
            store,
            cookie: None,
        }
    }

    /// Sends a request, carrying and updating the session cookie like a
    /// browser would.
    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().trim();
            if let Some(value) = pair.strip_prefix("session_id=") {
                self.cookie = if value.is_empty() {
                    None
                } else {
                    Some(pair.to_string())
                };
            }
        }

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn register(&mut self, username: &str, email: &str, password: &str) -> StatusCode {
        self.post(
            "/api/register",
            json!({
                "username": username,
                "email": email,
                "password": password,
                "confirm_password": password
            }),
        )
        .await
        .0
    }

    async fn login(&mut self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/login",
            json!({ "username": username, "password": password }),
        )
        .await
    }
}

// ============================================================================
// Full flow
// ============================================================================

#[tokio::test]
async fn test_register_login_session_logout_flow() {
    let mut app = TestApp::new(true);

    let (status, body) = app
        .post(
            "/api/register",
            json!({
                "username": "alice",
                "email": "a@x.com",
                "password": "p1",
                "confirm_password": "p1"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "회원가입이 완료되었습니다. 로그인해주세요.");

    let (status, body) = app.login("alice", "p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "성공적으로 로그인했습니다.");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["name"], "alice");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
    assert!(app.cookie.is_some());

    let (status, body) = app.get("/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["username"], "alice");

    let (status, body) = app.post("/api/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "로그아웃되었습니다.");
    assert!(app.cookie.is_none());

    let (status, body) = app.get("/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "authenticated": false }));
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_password_mismatch_creates_nothing() {
    let mut app = TestApp::new(true);

    let (status, body) = app
        .post(
            "/api/register",
            json!({
                "username": "alice",
                "email": "a@x.com",
                "password": "p1",
                "confirm_password": "p2"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "비밀번호가 일치하지 않습니다.");
    assert!(app.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let mut app = TestApp::new(true);

    assert_eq!(app.register("alice", "a@x.com", "p1").await, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/register",
            json!({
                "username": "  alice ",
                "email": "other@x.com",
                "password": "p2",
                "confirm_password": "p2"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "이미 존재하는 아이디입니다.");
    assert_eq!(app.store.inner.len().await, 1);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let mut app = TestApp::new(true);

    assert_eq!(app.register("alice", "a@x.com", "p1").await, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/register",
            json!({
                "username": "bob",
                "email": " a@x.com ",
                "password": "p2",
                "confirm_password": "p2"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "이미 등록된 이메일입니다.");
}

#[tokio::test]
async fn test_register_race_is_caught_by_the_store() {
    let mut app = TestApp::new(true);
    assert_eq!(app.register("alice", "a@x.com", "p1").await, StatusCode::CREATED);

    app.store.lookups_stale.store(true, Ordering::SeqCst);

    let (status, body) = app
        .post(
            "/api/register",
            json!({
                "username": "bob",
                "email": "a@x.com",
                "password": "p2",
                "confirm_password": "p2"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "이미 등록된 이메일입니다.");

    let (status, body) = app
        .post(
            "/api/register",
            json!({
                "username": "alice",
                "email": "other@x.com",
                "password": "p2",
                "confirm_password": "p2"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "이미 존재하는 아이디입니다.");

    assert_eq!(app.store.inner.len().await, 1);
}

#[tokio::test]
async fn test_register_requires_fields() {
    let mut app = TestApp::new(true);

    let (status, body) = app
        .post(
            "/api/register",
            json!({ "username": "alice", "password": "p1", "confirm_password": "p1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "모든 필드를 입력해주세요.");

    let (status, _) = app
        .post(
            "/api/register",
            json!({ "username": "   ", "email": "a@x.com", "password": "p1", "confirm_password": "p1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_email_optional_when_store_has_none() {
    let mut app = TestApp::new(false);

    let (status, _) = app
        .post(
            "/api/register",
            json!({ "username": "alice", "email": null, "password": "p1", "confirm_password": "p1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.login("alice", "p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], Value::Null);
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let mut app = TestApp::new(true);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::POST, "/api/register", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "모든 필드를 입력해주세요.");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_trims_username() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;

    let (status, body) = app.login("  alice  ", "p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let mut app = TestApp::new(true);

    let (status, body) = app.post("/api/login", json!({ "username": "alice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "아이디와 비밀번호를 모두 입력해주세요.");

    let (status, _) = app.login(" ", "p1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;

    for (username, password) in [("alice", "wrong"), ("nobody", "p1"), ("alice", "p1 ")] {
        let (status, body) = app.login(username, password).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "아이디 또는 비밀번호가 올바르지 않습니다.");
    }

    assert!(app.cookie.is_none());
    assert!(app.state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_relogin_replaces_previous_session() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;

    app.login("alice", "p1").await;
    let first = app.cookie.clone();
    app.login("alice", "p1").await;

    assert_ne!(app.cookie, first);
    assert_eq!(app.state.sessions.len().await, 1);
}

// ============================================================================
// Home
// ============================================================================

#[tokio::test]
async fn test_home_returns_three_cards() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;
    app.login("alice", "p1").await;

    let (status, body) = app.get("/api/home").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["username"], "alice");

    let titles: Vec<&str> = body["dashboard"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["오늘의 방문 예정", "확인 대기", "공지사항"]);
    assert_eq!(body["dashboard"][0]["description"], "예약된 방문자 3명");
}

#[tokio::test]
async fn test_home_requires_session() {
    let mut app = TestApp::new(true);

    let (status, body) = app.get("/api/home").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "authenticated": false }));
}

#[tokio::test]
async fn test_home_after_logout_is_unauthorized() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;
    app.login("alice", "p1").await;
    let stale_cookie = app.cookie.clone();

    let (status, _) = app.post("/api/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/home").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Replaying the old cookie does not revive the session.
    app.cookie = stale_cookie;
    let (status, _) = app.get("/api/home").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Logout and session healing
// ============================================================================

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let mut app = TestApp::new(true);

    let (status, body) = app.send(Method::POST, "/api/logout", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "로그아웃되었습니다.");
}

#[tokio::test]
async fn test_session_resets_when_user_vanishes() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;
    app.login("alice", "p1").await;
    assert_eq!(app.state.sessions.len().await, 1);

    app.store.users_vanished.store(true, Ordering::SeqCst);

    let (status, body) = app.get("/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "authenticated": false }));
    assert!(app.state.sessions.is_empty().await);
    assert!(app.cookie.is_none());
}

#[tokio::test]
async fn test_home_resets_session_when_user_vanishes() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;
    app.login("alice", "p1").await;

    app.store.users_vanished.store(true, Ordering::SeqCst);

    let (status, body) = app.get("/api/home").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "authenticated": false }));
    assert!(app.state.sessions.is_empty().await);
}

// ============================================================================
// Static assets
// ============================================================================

#[tokio::test]
async fn test_root_serves_index_html() {
    let app = TestApp::new(true);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{}", content_type);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("<title>HK Reception</title>"));
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn test_store_failures_return_generic_messages() {
    let mut app = TestApp::new(true);
    app.register("alice", "a@x.com", "p1").await;
    app.login("alice", "p1").await;

    app.store.failing.store(true, Ordering::SeqCst);

    let (status, body) = app.get("/api/session").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "데이터베이스 오류가 발생했습니다." }));

    let (status, body) = app.get("/api/home").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "대시보드 정보를 불러오지 못했습니다." }));

    let (status, body) = app.login("alice", "p1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "로그인 처리 중 문제가 발생했습니다." }));

    let (status, body) = app
        .post(
            "/api/register",
            json!({ "username": "bob", "email": "b@x.com", "password": "p", "confirm_password": "p" }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "회원가입 처리 중 문제가 발생했습니다." }));

    // A store outage does not end the session.
    app.store.failing.store(false, Ordering::SeqCst);
    let (_, body) = app.get("/api/session").await;
    assert_eq!(body["authenticated"], true);
}
