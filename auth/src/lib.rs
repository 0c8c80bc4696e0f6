//! # Dreamstart Authentication
//!
//! Passwordless email login for Dreamstart: users and workspaces, signed
//! login links, server-side sessions, and rate limiting.
//!
//! ## Features
//!
//! - **Passwordless**: signed, time-limited login links sent by email
//! - **Sessions**: cookie or bearer-token sessions with id rotation on login
//! - **Rate limiting**: sliding-window limits on login-link requests
//! - **Pluggable storage**: in-memory, Redis, and PostgreSQL (`postgres` feature)
//!
//! ## Login flow
//!
//! ```text
//! POST /login ─→ is_valid ─→ register_attempt ─→ send_login_link ─→ email
//! GET /email-login ─→ verify_link ─→ get_or_create_user ─→ login ─→ post_login
//! ```
//!
//! ## Example
//!
//! ```
//! use dreamstart_auth::memory::InMemoryUserRepository;
//! use dreamstart_auth::services::UserService;
//! use dreamstart_auth::UuidGenerator;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let users = UserService::new(InMemoryUserRepository::new(), Arc::new(UuidGenerator));
//! let profile = users.get_or_create_user("ada@example.com", None).await?;
//! assert!(profile.is_new());
//! # Ok::<(), dreamstart_auth::AuthError>(())
//! # });
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod id;
pub mod memory;
pub mod providers;
pub mod services;
pub mod signed_url;
pub mod state;
pub mod stores;
pub mod utils;

// Re-export main types for convenience
pub use config::{AuthConfig, RateLimitConfig};
pub use error::{AuthError, Result};
pub use id::{IdGenerator, NanoIdGenerator, UuidGenerator};
pub use signed_url::{SignatureError, UrlSigner};
pub use state::{ProfileResult, Session, SessionId, User, UserId, Workspace};
pub use stores::{RateLimiterBackend, SessionBackend, UserBackend};
