//! The bootstrapped application serves requests end to end.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use dreamstart::{Config, bootstrap};
use tower::ServiceExt;

fn config() -> Config {
    Config::from_lookup(|key| match key {
        "APP_ENV" => Some("test".to_string()),
        "APP_URL" => Some("http://localhost:4000".to_string()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_health_through_bootstrapped_router() {
    let app = bootstrap::build(&config()).await.unwrap();
    let router = dreamstart_web::router(app.state);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_link_request_is_accepted() {
    let app = bootstrap::build(&config()).await.unwrap();
    assert!(app.mail_worker.is_some());
    let router = dreamstart_web::router(app.state);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("intent=login&email=ada%40example.com"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/check-email?email=ada%40example.com"
    );
}

#[tokio::test]
async fn test_login_links_use_configured_url() {
    let app = bootstrap::build(&config()).await.unwrap();

    let link = app
        .state
        .email_login
        .send_login_link("ada@example.com")
        .unwrap();

    assert!(link.starts_with("http://localhost:4000/email-login?email=ada%40example.com"));
}
