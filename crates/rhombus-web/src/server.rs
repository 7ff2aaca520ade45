//! Server assembly and lifecycle

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::identity::OAuthIdentityProvider;
use crate::images::HttpImageComposer;
use crate::routes::{routes, AppState};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Build state with the production identity and image clients
///
/// # Errors
/// - `ServerError::Collaborator` if an HTTP client cannot be built
/// - `ServerError::Config` if `config` fails validation
pub fn build_state(config: ServerConfig) -> Result<AppState, ServerError> {
    if config.oauth.client_id.is_empty() || config.oauth.client_secret.is_empty() {
        tracing::warn!("OAuth client credentials are not set; logins will fail");
    }
    if config.image.api_key.is_empty() {
        tracing::warn!("Image API key is not set; thumbnails will fail");
    }

    let identity = OAuthIdentityProvider::new(config.oauth.clone())?;
    let images = HttpImageComposer::new(config.image.clone())?;
    Ok(AppState::new(config, Arc::new(identity), Arc::new(images))?)
}

/// Bind the listener and return the server future
///
/// The future completes once `shutdown` resolves and in-flight requests
/// drain.
///
/// # Errors
/// - `ServerError::Bind` if the address cannot be bound
pub fn start(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + 'static), ServerError> {
    let addr = state.config().bind_addr;
    let (bound, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    tracing::info!("Listening on http://{}", bound);
    Ok((bound, server))
}

/// Serve until `shutdown` resolves
///
/// # Errors
/// - `ServerError::Bind` if the address cannot be bound
pub async fn run(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let (_, server) = start(state, shutdown)?;
    server.await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
