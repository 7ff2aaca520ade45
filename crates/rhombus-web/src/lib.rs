//! Rhombus Web - authenticated boundary around the pattern generator
//!
//! - Configuration from TOML and environment
//! - Redirect-based OAuth login and server-side sessions
//! - `POST /pattern` rendering diamonds for logged-in users
//! - `POST /thumbnail` forwarding uploads to an image API
//!
//! # Example
//!
//! ```rust,ignore
//! use rhombus_web::{server, ServerConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load(None)?;
//! let state = Arc::new(server::build_state(config)?);
//! server::run(state, server::shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod identity;
pub mod images;
pub mod input;
pub mod routes;
pub mod server;
pub mod session;
pub mod telemetry;

pub use config::{ImageApiConfig, OAuthConfig, ServerConfig, DEFAULT_MAX_LINES};
pub use error::{CollaboratorError, ConfigError, ServerError, WebError};
pub use identity::{IdentityProvider, OAuthIdentityProvider};
pub use images::{HttpImageComposer, ImageComposer, ImageInput, ThumbnailRequest, MAX_IMAGES};
pub use input::parse_lines;
pub use routes::{routes, AppState, HomeView, PatternResponse};
pub use session::{Identity, LoginStates, RequestContext, SessionId, SessionStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
