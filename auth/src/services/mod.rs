//! Application services built on the provider traits.
//!
//! Services are generic over their storage so tests run against the
//! in-memory providers and production against Redis and PostgreSQL.

pub mod email_login;
pub mod session;
pub mod sign_up;
pub mod user;

pub use email_login::EmailLoginService;
pub use session::SessionService;
pub use sign_up::{POST_LOGIN_REDIRECT, SignUpService, is_local_path};
pub use user::UserService;
