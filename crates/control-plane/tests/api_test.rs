// Integration tests for the ContentDesk API
// Run with: cargo test -p contentdesk-control-plane --test api_test
// Drives the full router in-process against in-memory storage; upstreams are wiremock servers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use contentdesk_control_plane::auth::AuthConfig;
use contentdesk_control_plane::storage::{
    generate_encryption_key, EncryptionService, InMemoryDatabase, SecretCipher, StorageBackend,
};
use contentdesk_control_plane::{build_router, AppContext};
use contentdesk_upstream::{UpstreamClient, UpstreamConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWT_SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
    memory: Arc<InMemoryDatabase>,
}

struct TestResponse {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

impl TestApp {
    fn new(upstream: UpstreamConfig) -> Self {
        let cipher: Arc<dyn SecretCipher> = Arc::new(
            EncryptionService::new(&generate_encryption_key("test-key"), &[])
                .expect("Failed to build encryption service"),
        );
        let auth = AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..AuthConfig::default()
        };
        let memory = Arc::new(InMemoryDatabase::new());
        let ctx = AppContext::new(
            Arc::new(StorageBackend::InMemory(memory.clone())),
            auth,
            UpstreamClient::new(upstream).expect("Failed to build upstream client"),
            Some(cipher),
        );
        Self {
            router: build_router(&ctx, ""),
            memory,
        }
    }

    fn without_upstreams() -> Self {
        Self::new(UpstreamConfig::default())
    }

    /// Every upstream pointed at one mock server.
    fn with_mock(server: &MockServer) -> Self {
        Self::new(UpstreamConfig {
            ai_backend_url: Some(server.uri()),
            tts_endpoint: Some(format!("{}/tts", server.uri())),
            image_endpoint: Some(format!("{}/image", server.uri())),
            timeout: Duration::from_secs(5),
        })
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    async fn signup(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth",
            None,
            Some(json!({
                "action": "signup",
                "username": username,
                "email": email,
                "password": password
            })),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth",
            None,
            Some(json!({"action": "login", "email": email, "password": password})),
        )
        .await
    }

    /// Sign up and log in; returns the `Cookie` header value.
    async fn session(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        let signup = self.signup(username, &email, "pw-123").await;
        assert_eq!(signup.status, StatusCode::OK, "signup failed: {}", signup.body);
        let login = self.login(&email, "pw-123").await;
        cookie_pair(&login).expect("login did not set a cookie")
    }
}

/// `name=value` from a Set-Cookie header.
fn cookie_pair(response: &TestResponse) -> Option<String> {
    response
        .set_cookie
        .as_deref()
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
}

fn token_for(email: &str, issued_at: i64, expires_at: i64) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({"email": email, "iat": issued_at, "exp": expires_at}),
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

// ============================================
// Auth
// ============================================

#[tokio::test]
async fn test_signup_and_duplicate_email() {
    let app = TestApp::without_upstreams();

    let first = app.signup("writer", "writer@example.com", "pw-123").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["message"], "User created");
    assert_eq!(first.body["user"]["email"], "writer@example.com");
    assert!(first.body["user"]["id"].is_string());
    assert!(first.set_cookie.is_none(), "signup must not start a session");

    let duplicate = app.signup("other", "writer@example.com", "pw-456").await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["error"], "Email already registered");

    // The first account still logs in with its own password
    let login = app.login("writer@example.com", "pw-123").await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["id"], first.body["user"]["id"]);
}

#[tokio::test]
async fn test_auth_request_validation() {
    let app = TestApp::without_upstreams();

    let missing = app
        .request(
            Method::POST,
            "/api/auth",
            None,
            Some(json!({"action": "login", "email": "a@example.com"})),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Missing fields");

    let no_username = app
        .request(
            Method::POST,
            "/api/auth",
            None,
            Some(json!({"action": "signup", "email": "a@example.com", "password": "pw"})),
        )
        .await;
    assert_eq!(no_username.body["error"], "Username required for signup");

    let bad_action = app
        .request(
            Method::POST,
            "/api/auth",
            None,
            Some(json!({"action": "reset", "email": "a@example.com", "password": "pw"})),
        )
        .await;
    assert_eq!(bad_action.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_action.body["error"], "Invalid action");
}

#[tokio::test]
async fn test_login_cookie_and_failures() {
    let app = TestApp::without_upstreams();
    app.signup("writer", "writer@example.com", "right").await;

    let ok = app.login("writer@example.com", "right").await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["message"], "Login successful");
    let cookie = ok.set_cookie.expect("login should set a cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));

    let wrong = app.login("writer@example.com", "wrong").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "Incorrect password");
    assert!(wrong.set_cookie.is_none());

    let unknown = app.login("nobody@example.com", "right").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "User not found");
}

#[tokio::test]
async fn test_me_requires_valid_session() {
    let app = TestApp::without_upstreams();
    let signup = app.signup("writer", "writer@example.com", "pw").await;
    let login = app.login("writer@example.com", "pw").await;
    let cookie = cookie_pair(&login).unwrap();

    let guest = app.request(Method::GET, "/api/me", None, None).await;
    assert_eq!(guest.status, StatusCode::UNAUTHORIZED);

    let me = app.request(Method::GET, "/api/me", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["id"], signup.body["user"]["id"]);
    assert_eq!(me.body["user"]["username"], "writer");
    assert_eq!(me.body["user"]["hasXCredentials"], false);

    let tampered = format!("{}x", cookie);
    let me = app.request(Method::GET, "/api/me", Some(&tampered), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let now = chrono::Utc::now().timestamp();
    let expired = format!(
        "auth_token={}",
        token_for("writer@example.com", now - 8 * 86_400, now - 86_400)
    );
    let me = app.request(Method::GET, "/api/me", Some(&expired), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let unknown_user = format!(
        "auth_token={}",
        token_for("ghost@example.com", now, now + 3_600)
    );
    let me = app
        .request(Method::GET, "/api/me", Some(&unknown_user), None)
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::without_upstreams();
    let response = app.request(Method::POST, "/api/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.set_cookie.expect("logout should expire the cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("Max-Age=0"));

    let session = app.session("writer").await;
    let response = app
        .request(Method::POST, "/api/logout", Some(&session), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.set_cookie.expect("logout should expire the cookie");
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// ============================================
// CRUD resources
// ============================================

#[tokio::test]
async fn test_resource_routes_require_session() {
    let app = TestApp::without_upstreams();
    for uri in [
        "/api/generated-images",
        "/api/text-to-audio",
        "/api/saved-articles",
        "/api/user/x-credentials",
    ] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.body["error"], "Not authenticated");
    }
}

#[tokio::test]
async fn test_image_ownership() {
    let app = TestApp::without_upstreams();
    let alice = app.session("alice").await;
    let bob = app.session("bob").await;

    let created = app
        .request(
            Method::POST,
            "/api/generated-images",
            Some(&alice),
            Some(json!({
                "prompt": "A lighthouse",
                "fileKey": "images/1.png",
                "imageUrl": "https://img.example.com/1.png"
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["status"], "success");
    let id = created.body["image"]["id"].as_str().unwrap().to_string();

    let bobs = app
        .request(Method::GET, "/api/generated-images", Some(&bob), None)
        .await;
    assert_eq!(bobs.body["images"], json!([]));

    let stolen = app
        .request(
            Method::DELETE,
            &format!("/api/generated-images?id={}", id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);
    assert_eq!(stolen.body["error"], "Not found");

    let alices = app
        .request(Method::GET, "/api/generated-images", Some(&alice), None)
        .await;
    assert_eq!(alices.body["images"].as_array().unwrap().len(), 1);
    assert_eq!(alices.body["images"][0]["fileKey"], "images/1.png");

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/generated-images?id={}", id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["status"], "deleted");
}

#[tokio::test]
async fn test_image_validation() {
    let app = TestApp::without_upstreams();
    let cookie = app.session("writer").await;

    let missing = app
        .request(
            Method::POST,
            "/api/generated-images",
            Some(&cookie),
            Some(json!({"prompt": "A lighthouse", "fileKey": ""})),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Missing prompt, fileKey, or imageUrl");

    let bad_id = app
        .request(
            Method::DELETE,
            "/api/generated-images?id=not-a-uuid",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"], "Invalid id");

    let duplicate_id = app
        .request(
            Method::DELETE,
            "/api/generated-images?id=a&id=b",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(duplicate_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate_id.body["error"], "Invalid query string");

    let not_json = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/generated-images")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_saved_articles() {
    let app = TestApp::without_upstreams();
    let cookie = app.session("writer").await;

    let news = app
        .request(
            Method::POST,
            "/api/save-news-article",
            Some(&cookie),
            Some(json!({"threadId": "t-1", "result": "News body", "url": "https://n.example.com"})),
        )
        .await;
    assert_eq!(news.status, StatusCode::OK);
    assert_eq!(news.body["saved"]["kind"], "news");
    assert_eq!(news.body["saved"]["username"], "writer");

    let blog = app
        .request(
            Method::POST,
            "/api/save-blog",
            Some(&cookie),
            Some(json!({"threadId": "t-2", "result": "Blog body"})),
        )
        .await;
    assert_eq!(blog.status, StatusCode::OK);
    assert_eq!(blog.body["saved"]["url"], "");

    let missing = app
        .request(
            Method::POST,
            "/api/save-blog",
            Some(&cookie),
            Some(json!({"threadId": "t-3"})),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Missing fields");

    let all = app
        .request(Method::GET, "/api/saved-articles", Some(&cookie), None)
        .await;
    let articles = all.body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 2);
    // Newest first
    assert_eq!(articles[0]["threadId"], "t-2");

    let only_news = app
        .request(
            Method::GET,
            "/api/saved-articles?kind=news",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(only_news.body["articles"].as_array().unwrap().len(), 1);

    let bad_kind = app
        .request(
            Method::GET,
            "/api/saved-articles?kind=video",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(bad_kind.status, StatusCode::BAD_REQUEST);
}

// ============================================
// Credential vault
// ============================================

#[tokio::test]
async fn test_x_credentials_round_trip() {
    let app = TestApp::without_upstreams();
    let cookie = app.session("writer").await;

    let saved = app
        .request(
            Method::PUT,
            "/api/user/x-credentials",
            Some(&cookie),
            Some(json!({"apiKey": "k1", "apiSecret": "s1", "bearerToken": "b1"})),
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.body["connected"], true);
    assert!(!saved.body.to_string().contains("s1"));

    let status = app
        .request(Method::GET, "/api/user/x-credentials", Some(&cookie), None)
        .await;
    assert_eq!(status.body, json!({"connected": true}));

    let me = app.request(Method::GET, "/api/me", Some(&cookie), None).await;
    assert_eq!(me.body["user"]["hasXCredentials"], true);

    let posted = app
        .request(
            Method::POST,
            "/api/x/post",
            Some(&cookie),
            Some(json!({"text": "Hello X"})),
        )
        .await;
    assert_eq!(posted.status, StatusCode::OK);
    assert_eq!(posted.body, json!({"ok": true, "posted": "Hello X"}));

    let removed = app
        .request(Method::DELETE, "/api/user/x-credentials", Some(&cookie), None)
        .await;
    assert_eq!(removed.body["connected"], false);

    let posted = app
        .request(
            Method::POST,
            "/api/x/post",
            Some(&cookie),
            Some(json!({"text": "Hello X"})),
        )
        .await;
    assert_eq!(posted.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        posted.body["error"],
        "X credentials are incomplete. Please fill them out again."
    );
}

#[tokio::test]
async fn test_x_credentials_validation() {
    let app = TestApp::without_upstreams();
    let cookie = app.session("writer").await;

    let partial = app
        .request(
            Method::PUT,
            "/api/user/x-credentials",
            Some(&cookie),
            Some(json!({"apiKey": "k1", "apiSecret": " ", "bearerToken": "b1"})),
        )
        .await;
    assert_eq!(partial.status, StatusCode::BAD_REQUEST);

    let empty_text = app
        .request(
            Method::POST,
            "/api/x/post",
            Some(&cookie),
            Some(json!({"text": ""})),
        )
        .await;
    assert_eq!(empty_text.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty_text.body["error"], "Text is required.");
}

// ============================================
// Upstream-backed routes
// ============================================

#[tokio::test]
async fn test_tts_rejects_long_text_before_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audio_url": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/text-to-audio",
            Some(&cookie),
            Some(json!({"text": "a".repeat(401), "description": "calm voice"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Text must be 400 characters or less");

    let no_description = app
        .request(
            Method::POST,
            "/api/text-to-audio",
            Some(&cookie),
            Some(json!({"text": "hello"})),
        )
        .await;
    assert_eq!(no_description.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_description.body["error"], "Voice description is required");
}

#[tokio::test]
async fn test_tts_forwards_and_records() {
    let server = MockServer::start().await;
    let text = "a".repeat(400);
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(body_json(json!({"text": text, "description": "calm voice"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"audioUrl": "https://a.example.com/1.wav"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/text-to-audio",
            Some(&cookie),
            Some(json!({"text": text, "description": "calm voice", "voiceLabel": "Narrator"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["audio"]["audioUrl"], "https://a.example.com/1.wav");
    assert_eq!(response.body["audio"]["voiceLabel"], "Narrator");
    assert!(response.body["audio"]["id"].is_string());

    let listed = app
        .request(Method::GET, "/api/text-to-audio", Some(&cookie), None)
        .await;
    assert_eq!(listed.body["audios"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upstream_error_message_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad request"})))
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/text-to-audio",
            Some(&cookie),
            Some(json!({"text": "hello", "description": "calm voice"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({"error": "bad request"}));
}

#[tokio::test]
async fn test_tts_not_configured() {
    let app = TestApp::without_upstreams();
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/text-to-audio",
            Some(&cookie),
            Some(json!({"text": "hello", "description": "calm voice"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "TTS endpoint not configured");
}

#[tokio::test]
async fn test_generate_image_records_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image"))
        .and(body_json(json!({"prompt": "A lighthouse"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_url": "https://img.example.com/7.png",
            "file_key": "images/7.png"
        })))
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/generate-image",
            Some(&cookie),
            Some(json!({"prompt": "A lighthouse"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["image"]["imageUrl"], "https://img.example.com/7.png");

    let mut images = Vec::new();
    for _ in 0..50 {
        let listed = app
            .request(Method::GET, "/api/generated-images", Some(&cookie), None)
            .await;
        images = listed.body["images"].as_array().cloned().unwrap_or_default();
        if !images.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["fileKey"], "images/7.png");
}

#[tokio::test]
async fn test_generate_blog_relays_and_saves() {
    let server = MockServer::start().await;
    let reply = json!({
        "status": "completed",
        "threadId": "thread-42",
        "generated_blog": "# Ten tips"
    });
    Mock::given(method("POST"))
        .and(path("/generate-blog"))
        .and(body_json(json!({"topic": "rust", "tone": "casual"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/generate-blog",
            Some(&cookie),
            Some(json!({"topic": "rust", "tone": "casual"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, reply);

    let mut articles = Vec::new();
    for _ in 0..50 {
        let listed = app
            .request(
                Method::GET,
                "/api/saved-articles?kind=blog",
                Some(&cookie),
                None,
            )
            .await;
        articles = listed.body["articles"].as_array().cloned().unwrap_or_default();
        if !articles.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["threadId"], "thread-42");
    assert_eq!(articles[0]["result"], "# Ten tips");
}

#[tokio::test]
async fn test_tts_survives_failed_save() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"audio_url": "https://a.example.com/2.wav"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;
    app.memory.set_fail_content_writes(true);

    let response = app
        .request(
            Method::POST,
            "/api/text-to-audio",
            Some(&cookie),
            Some(json!({"text": "hello", "description": "calm voice"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["audio"]["audioUrl"], "https://a.example.com/2.wav");
    assert_eq!(response.body["audio"]["text"], "hello");
    assert!(response.body["audio"].get("id").is_none());
    assert!(response.body["audio"].get("createdAt").is_none());

    let listed = app
        .request(Method::GET, "/api/text-to-audio", Some(&cookie), None)
        .await;
    assert!(listed.body["audios"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_image_survives_failed_save() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "imageUrl": "https://img.example.com/8.png",
            "fileKey": "images/8.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;
    app.memory.set_fail_content_writes(true);

    let response = app
        .request(
            Method::POST,
            "/api/generate-image",
            Some(&cookie),
            Some(json!({"prompt": "A harbor"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["image"]["imageUrl"], "https://img.example.com/8.png");
    assert_eq!(response.body["image"]["fileKey"], "images/8.png");

    tokio::time::sleep(Duration::from_millis(50)).await;
    let listed = app
        .request(Method::GET, "/api/generated-images", Some(&cookie), None)
        .await;
    assert!(listed.body["images"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_news_survives_failed_save() {
    let server = MockServer::start().await;
    let reply = json!({
        "threadId": "thread-7",
        "generated_article": "Markets rallied today."
    });
    Mock::given(method("POST"))
        .and(path("/generate-news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;
    app.memory.set_fail_content_writes(true);

    let response = app
        .request(
            Method::POST,
            "/api/generate-news",
            Some(&cookie),
            Some(json!({"topic": "markets"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, reply);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let listed = app
        .request(
            Method::GET,
            "/api/saved-articles?kind=news",
            Some(&cookie),
            None,
        )
        .await;
    assert!(listed.body["articles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_workflow_validation_skips_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let cases = [
        ("/api/x-post/generate", json!({"topic": "rust"}), "Topic and objective are required."),
        ("/api/x-post/ideas", json!({"keywords": "rust"}), "Keywords must be an array of strings."),
        ("/api/x-post/ideas", json!({"keywords": [], "count": 0}), "Count must be a positive integer."),
        ("/api/repurpose-article", json!({}), "Article text is required."),
        ("/api/youtube-blog", json!({"youtube_url": " "}), "YouTube URL is required."),
        ("/api/image-prompt", json!(["not", "an", "object"]), "Request body must be a JSON object"),
    ];
    for (uri, body, message) in cases {
        let response = app.request(Method::POST, uri, Some(&cookie), Some(body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(response.body["error"], message, "{}", uri);
    }
}

#[tokio::test]
async fn test_workflow_upstream_detail_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x-post/ideas"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"msg": "field required"}, {"msg": "value too long"}]
        })))
        .mount(&server)
        .await;

    let app = TestApp::with_mock(&server);
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/x-post/ideas",
            Some(&cookie),
            Some(json!({"keywords": []})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "field required; value too long");
}

#[tokio::test]
async fn test_workflow_upstream_unreachable() {
    let app = TestApp::new(UpstreamConfig {
        ai_backend_url: Some("http://127.0.0.1:9".to_string()),
        timeout: Duration::from_secs(2),
        ..UpstreamConfig::default()
    });
    let cookie = app.session("writer").await;

    let response = app
        .request(
            Method::POST,
            "/api/generate-news",
            Some(&cookie),
            Some(json!({"topic": "rust"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "Unable to reach AI backend service");
}
