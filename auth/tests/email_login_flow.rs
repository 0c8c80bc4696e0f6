//! Integration tests for the passwordless login flow.
//!
//! Drives the services the way the HTTP layer does: request a link, follow
//! it, create or find the user, log in, and redirect.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use dreamstart_auth::memory::{InMemoryRateLimiter, InMemorySessionStore, InMemoryUserRepository};
use dreamstart_auth::services::{
    EmailLoginService, POST_LOGIN_REDIRECT, SessionService, SignUpService, UserService,
};
use dreamstart_auth::{AuthConfig, AuthError, SignatureError, UuidGenerator};
use dreamstart_mail::{EmailAddresses, MailQueue, MailReceiver, MailService, Renderer};
use std::sync::Arc;

struct Harness {
    logins: EmailLoginService<InMemoryRateLimiter>,
    users: UserService<InMemoryUserRepository>,
    sessions: SessionService<InMemorySessionStore>,
    sign_up: SignUpService,
    outbox: MailReceiver,
}

fn harness() -> Harness {
    let (queue, outbox) = MailQueue::new();
    let mail = MailService::new(Renderer::new(false), queue, EmailAddresses::default());
    let config = Arc::new(AuthConfig::new("https://app.example.com", "integration-key"));

    Harness {
        logins: EmailLoginService::new(InMemoryRateLimiter::new(), mail.clone(), Arc::clone(&config)),
        users: UserService::new(InMemoryUserRepository::new(), Arc::new(UuidGenerator)),
        sessions: SessionService::new(InMemorySessionStore::new(), config.session_ttl),
        sign_up: SignUpService::new(mail),
        outbox,
    }
}

/// Follow a login link: returns the redirect URL and the session cookie value.
async fn follow(h: &Harness, link: &str, cookie: Option<&str>) -> Result<(String, String), AuthError> {
    let parsed = url::Url::parse(link).unwrap();
    h.logins.verify_link(parsed.path(), parsed.query())?;

    let email = parsed
        .query_pairs()
        .find(|(k, _)| k == "email")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let profile = h.users.get_or_create_user(&email, None).await?;
    if profile.is_new() {
        h.sign_up.post_sign_up(profile.user())?;
    }

    let mut session = h.sessions.load(cookie).await?;
    h.sessions.login(&mut session, profile.user()).await?;
    let redirect = h.sign_up.post_login(&mut session, link)?;
    h.sessions.commit(&mut session).await?;

    Ok((redirect, session.id.to_string()))
}

#[tokio::test]
async fn test_first_login_creates_user_and_sends_welcome() {
    let mut h = harness();

    let link = h.logins.send_login_link("ada@example.com").unwrap();
    let login_mail = h.outbox.try_next().unwrap();
    assert_eq!(login_mail.mail.subject, "Sign in to your account");

    let (redirect, cookie) = follow(&h, &link, None).await.unwrap();
    assert_eq!(redirect, "https://app.example.com/");

    let welcome = h.outbox.try_next().unwrap();
    assert_eq!(welcome.mail.subject, "Welcome aboard");
    assert_eq!(welcome.mail.to, "ada@example.com");

    let session = h.sessions.load(Some(&cookie)).await.unwrap();
    let user = h.users.get_user("ada@example.com").await.unwrap().unwrap();
    assert_eq!(session.user_id, Some(user.id.clone()));
    assert_eq!(h.users.workspaces(&user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_login_reuses_user_without_welcome() {
    let mut h = harness();

    let link = h.logins.send_login_link("ada@example.com").unwrap();
    follow(&h, &link, None).await.unwrap();
    follow(&h, &link, None).await.unwrap();

    // login mail + one welcome
    assert_eq!(h.outbox.len(), 2);
    assert_eq!(h.users.repository().user_count().unwrap(), 1);
}

#[tokio::test]
async fn test_login_returns_to_stored_page() {
    let h = harness();

    let mut anonymous = h.sessions.load(None).await.unwrap();
    anonymous.put(POST_LOGIN_REDIRECT, "/projects/42");
    h.sessions.commit(&mut anonymous).await.unwrap();

    let link = h.logins.send_login_link("ada@example.com").unwrap();
    let (redirect, cookie) = follow(&h, &link, Some(anonymous.id.as_str())).await.unwrap();

    assert_eq!(redirect, "https://app.example.com/projects/42");
    assert_ne!(cookie, anonymous.id.to_string());
}

#[tokio::test]
async fn test_expired_link_rejected() {
    let (queue, _outbox) = MailQueue::new();
    let mail = MailService::new(Renderer::new(false), queue, EmailAddresses::default());
    let mut config = AuthConfig::new("https://app.example.com", "integration-key");
    config.login_link_ttl = Duration::seconds(-5);
    let logins = EmailLoginService::new(InMemoryRateLimiter::new(), mail, Arc::new(config));

    let link = logins.send_login_link("ada@example.com").unwrap();
    let parsed = url::Url::parse(&link).unwrap();

    assert_eq!(
        logins.verify_link(parsed.path(), parsed.query()).unwrap_err(),
        AuthError::InvalidSignature(SignatureError::Expired)
    );
}

#[tokio::test]
async fn test_link_signed_with_other_key_rejected() {
    let h = harness();
    let (queue, _outbox) = MailQueue::new();
    let mail = MailService::new(Renderer::new(false), queue, EmailAddresses::default());
    let other = EmailLoginService::new(
        InMemoryRateLimiter::new(),
        mail,
        Arc::new(AuthConfig::new("https://app.example.com", "another-key")),
    );

    let link = other.send_login_link("ada@example.com").unwrap();
    let err = follow(&h, &link, None).await.unwrap_err();

    assert_eq!(err, AuthError::InvalidSignature(SignatureError::Invalid));
    assert_eq!(h.users.repository().user_count().unwrap(), 0);
}
