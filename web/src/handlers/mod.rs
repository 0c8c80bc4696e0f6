//! HTTP handlers, one module per page or resource.

pub mod email_login;
pub mod health;
pub mod home;
pub mod login;
pub mod logout;
pub mod theme;
