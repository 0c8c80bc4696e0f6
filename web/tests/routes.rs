//! Router tests: every route through the full middleware stack.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
    response::Response,
};
use dreamstart_auth::{AuthConfig, RateLimitConfig, UuidGenerator};
use dreamstart_mail::{EmailAddresses, MailQueue, MailReceiver, MailService, Renderer};
use dreamstart_web::{AppState, Backends, SESSION_COOKIE, router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const APP_URL: &str = "http://localhost:3333";

struct TestApp {
    app: Router,
    state: AppState,
    outbox: MailReceiver,
}

fn test_app(production: bool) -> TestApp {
    let (queue, outbox) = MailQueue::new();
    let mail = MailService::new(Renderer::new(false), queue, EmailAddresses::default());
    let config = AuthConfig::new(APP_URL, "test-key")
        .with_production(production)
        .with_login_rate_limit(RateLimitConfig {
            max_attempts: 2,
            window: Duration::from_secs(3600),
        });

    let state = AppState::new(config, Backends::in_memory(), mail, Arc::new(UuidGenerator)).unwrap();
    TestApp {
        app: router(state.clone()),
        state,
        outbox,
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// `name=value` pairs from every `Set-Cookie` header.
fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect()
}

/// The session cookie set by `response`, unless it was cleared.
fn session_cookie(response: &Response) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{SESSION_COOKIE}=")) && !c.ends_with('='))
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Follow a freshly signed login link; returns the response.
async fn follow_login_link(t: &TestApp, email: &str, cookie: Option<&str>) -> Response {
    let link = t.state.email_login.send_login_link(email).unwrap();
    let url = url::Url::parse(&link).unwrap();
    let uri = format!("{}?{}", url.path(), url.query().unwrap());
    send(&t.app, get(&uri, cookie)).await
}

async fn logged_in(t: &TestApp, email: &str) -> String {
    let response = follow_login_link(t, email, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// Health & open pages
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health() {
    let t = test_app(false);
    let response = send(&t.app, get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-Correlation-ID"));
    assert!(session_cookie(&response).is_none());
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn test_login_page_anonymous() {
    let t = test_app(false);
    let response = send(&t.app, get("/login", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["user"], Value::Null);
}

#[tokio::test]
async fn test_check_email_page() {
    let t = test_app(false);
    let response = send(&t.app, get("/check-email?email=ada%40gmail.com", None)).await;

    let body = json(response).await;
    assert_eq!(body["email"], "ada@gmail.com");
    assert_eq!(body["open_gmail"], true);
}

// ═══════════════════════════════════════════════════════════════════════
// Auth guard
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_private_route_redirects_to_login() {
    let t = test_app(false);
    let response = send(&t.app, get("/?tab=2", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn test_login_returns_to_remembered_page() {
    let mut t = test_app(false);

    let response = send(&t.app, get("/?tab=2", None)).await;
    let anonymous = session_cookie(&response).unwrap();

    let response = send(
        &t.app,
        post_form("/login", "intent=login&email=ada%40example.com", Some(&anonymous)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/check-email?email=ada%40example.com");
    let queued = t.outbox.try_next().unwrap();
    assert_eq!(queued.mail.to, "ada@example.com");
    assert_eq!(queued.mail.subject, "Sign in to your account");

    let response = follow_login_link(&t, "ada@example.com", Some(&anonymous)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{APP_URL}/?tab=2"));
    let authenticated = session_cookie(&response).unwrap();
    assert_ne!(authenticated, anonymous);

    let response = send(&t.app, get("/", Some(&authenticated))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["workspaces"][0]["name"], "Personal");
}

#[tokio::test]
async fn test_login_never_redirects_off_site() {
    let t = test_app(false);

    let response = send(&t.app, get("//evil.example/phish", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let anonymous = session_cookie(&response);

    let response = follow_login_link(&t, "ada@example.com", anonymous.as_deref()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{APP_URL}/"));
}

#[tokio::test]
async fn test_new_user_gets_welcome_mail_once() {
    let mut t = test_app(false);

    logged_in(&t, "ada@example.com").await;
    logged_in(&t, "ada@example.com").await;

    let subjects: Vec<String> = std::iter::from_fn(|| t.outbox.try_next())
        .map(|job| job.mail.subject)
        .collect();
    let welcomes = subjects.iter().filter(|s| s.as_str() == "Welcome aboard").count();
    assert_eq!(welcomes, 1);
}

#[tokio::test]
async fn test_bearer_token_query_parameter() {
    let t = test_app(false);
    let cookie = logged_in(&t, "ada@example.com").await;
    let token = cookie.trim_start_matches(&format!("{SESSION_COOKIE}=")).to_string();

    let response = send(&t.app, get(&format!("/?bearerToken={token}"), None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_logged_in_login_page_shows_user() {
    let t = test_app(false);
    let cookie = logged_in(&t, "ada@example.com").await;

    let response = send(&t.app, get("/login", Some(&cookie))).await;

    assert_eq!(json(response).await["user"]["email"], "ada@example.com");
}

// ═══════════════════════════════════════════════════════════════════════
// POST /login
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_login_form_validation() {
    let t = test_app(false);

    let response = send(&t.app, post_form("/login", "intent=login&email=nope", None)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"][0]["field"], "email");

    let response = send(&t.app, post_form("/login", "email=ada%40example.com", None)).await;
    let body = json(response).await;
    assert_eq!(body["errors"][0]["field"], "intent");
    assert_eq!(body["errors"][0]["rule"], "required");

    let response = send(&t.app, post_form("/login", "intent=register", None)).await;
    let body = json(response).await;
    assert_eq!(body["errors"][0]["rule"], "enum");
    assert_eq!(body["errors"][0]["choices"][0], "login");
}

#[tokio::test]
async fn test_login_rejects_disposable_domain() {
    let mut t = test_app(false);

    let response = send(&t.app, post_form("/login", "intent=login&email=ada%40mailinator.com", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(response).await["error"],
        "Invalid email provider. Please use a different email."
    );
    assert!(t.outbox.try_next().is_none());
}

#[tokio::test]
async fn test_login_rate_limited_in_production() {
    let t = test_app(true);
    let body = "intent=login&email=ada%40example.com";

    for _ in 0..2 {
        let response = send(&t.app, post_form("/login", body, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let response = send(&t.app, post_form("/login", body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(response).await["error"],
        "Too many attempts. Please try again later."
    );
}

fn login_from(peer: Option<[u8; 4]>, forwarded_for: &str) -> Request<Body> {
    let mut request = post_form("/login", "intent=login&email=ada%40example.com", None);
    request
        .headers_mut()
        .insert("X-Forwarded-For", forwarded_for.parse().unwrap());
    if let Some(peer) = peer {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 50000))));
    }
    request
}

#[tokio::test]
async fn test_rate_limit_ignores_spoofed_forwarded_for() {
    for peer in [None, Some([192, 0, 2, 10])] {
        let t = test_app(true);

        let mut statuses = Vec::new();
        for i in 0..5 {
            let request = login_from(peer, &format!("198.51.100.{i}"));
            statuses.push(send(&t.app, request).await.status());
        }

        assert_eq!(&statuses[..2], &[StatusCode::SEE_OTHER; 2], "peer {peer:?}");
        assert!(
            statuses[2..].iter().all(|s| *s == StatusCode::BAD_REQUEST),
            "peer {peer:?}: {statuses:?}"
        );
    }
}

#[tokio::test]
async fn test_rate_limit_keys_on_client_behind_trusted_proxy() {
    let t = test_app(true);

    for i in 0..3 {
        let request = login_from(Some([127, 0, 0, 1]), &format!("198.51.100.{i}"));
        assert_eq!(send(&t.app, request).await.status(), StatusCode::SEE_OTHER);
    }

    let request = login_from(Some([127, 0, 0, 1]), "198.51.100.0");
    assert_eq!(send(&t.app, request).await.status(), StatusCode::SEE_OTHER);
    let request = login_from(Some([127, 0, 0, 1]), "198.51.100.0");
    assert_eq!(send(&t.app, request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_accepts_json() {
    let t = test_app(false);
    let response = send(
        &t.app,
        post_json("/login", &serde_json::json!({ "intent": "login", "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// ═══════════════════════════════════════════════════════════════════════
// GET /email-login
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_tampered_link_is_unauthorized() {
    let t = test_app(false);
    let link = t.state.email_login.send_login_link("ada@example.com").unwrap();
    let url = url::Url::parse(&link).unwrap();
    let query = url.query().unwrap().replace("ada%40", "eve%40");

    let response = send(&t.app, get(&format!("/email-login?{query}"), None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(text(response).await, "The URL signature is invalid");
}

#[tokio::test]
async fn test_unsigned_link_is_unauthorized() {
    let t = test_app(false);
    let response = send(&t.app, get("/email-login?email=ada%40example.com", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_link_with_bad_email_is_invalid() {
    let t = test_app(false);
    let link = t
        .state
        .email_login
        .signer()
        .make_signed("/email-login", &[("email", "not-an-email")], None);
    let url = url::Url::parse(&link).unwrap();

    let response = send(&t.app, get(&format!("/email-login?{}", url.query().unwrap()), None)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ═══════════════════════════════════════════════════════════════════════
// POST /logout
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_logout_ends_session() {
    let t = test_app(false);
    let cookie = logged_in(&t, "ada@example.com").await;

    let response = send(&t.app, post_form("/logout", "intent=log_out", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c == &format!("{SESSION_COOKIE}="))
    );

    let response = send(&t.app, get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_logout_requires_intent() {
    let t = test_app(false);
    let cookie = logged_in(&t, "ada@example.com").await;

    let response = send(&t.app, post_form("/logout", "", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ═══════════════════════════════════════════════════════════════════════
// Theme resource
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_theme_defaults_to_system() {
    let t = test_app(false);
    let response = send(&t.app, get("/resources/theme", None)).await;

    assert_eq!(json(response).await["theme"], "system");
}

#[tokio::test]
async fn test_theme_reads_cookie() {
    let t = test_app(false);
    let response = send(&t.app, get("/resources/theme", Some("app-theme=dark"))).await;

    assert_eq!(json(response).await["theme"], "dark");
}

#[tokio::test]
async fn test_change_theme_sets_and_clears_cookie() {
    let t = test_app(false);

    let response = send(&t.app, post_form("/resources/theme", "intent=change-theme&theme=dark", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookies(&response).contains(&"app-theme=dark".to_string()));

    let response = send(
        &t.app,
        post_form("/resources/theme", "intent=change-theme&theme=system", Some("app-theme=dark")),
    )
    .await;
    assert!(set_cookies(&response).contains(&"app-theme=".to_string()));

    let response = send(&t.app, post_form("/resources/theme", "intent=change-theme&theme=neon", None)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_prefer_dark_mode_cookie() {
    let t = test_app(false);
    let response = send(
        &t.app,
        post_json(
            "/resources/theme",
            &serde_json::json!({ "intent": "set-prefer-dark-mode", "prefersDarkMode": true }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookies(&response).contains(&"prefers-dark-mode=true".to_string()));
}
