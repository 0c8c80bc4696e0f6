//! # Dreamstart
//!
//! Server assembly for Dreamstart: environment configuration and the wiring
//! of storage, mail delivery, and HTTP state. The `dreamstart` binary serves
//! the router built from the result.
//!
//! ```no_run
//! use dreamstart::{bootstrap, config::Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let app = bootstrap::build(&config).await?;
//! let router = dreamstart_web::router(app.state);
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod bootstrap;
pub mod config;

pub use bootstrap::{Application, build};
pub use config::{Config, ConfigError, Environment};
