//! Identity provider collaborator
//!
//! Redirect-based OAuth 2.0 authorization-code login. The boundary only needs
//! two operations: build the browser redirect, and turn the callback `code`
//! into an [`Identity`].

use crate::config::OAuthConfig;
use crate::error::CollaboratorError;
use crate::session::Identity;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

const SERVICE: &str = "identity provider";

/// Identity provider seam
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Browser redirect target for a login carrying `state`
    ///
    /// # Errors
    /// - `CollaboratorError::Config` if the provider URL is malformed
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<Url, CollaboratorError>;

    /// Exchange a callback `code` for the user's identity
    ///
    /// # Errors
    /// - Any `CollaboratorError` from the remote exchange
    async fn exchange(&self, code: &str, redirect_uri: &str)
        -> Result<Identity, CollaboratorError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth 2.0 client over reqwest
#[derive(Debug, Clone)]
pub struct OAuthIdentityProvider {
    client: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthIdentityProvider {
    /// Build client from config
    ///
    /// # Errors
    /// - `CollaboratorError::Request` if the HTTP client cannot be built
    pub fn new(config: OAuthConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(CollaboratorError::request(SERVICE))?;
        Ok(Self { client, config })
    }

    async fn fetch_token(&self, code: &str, redirect_uri: &str) -> Result<String, CollaboratorError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let resp = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(CollaboratorError::request(SERVICE))?;

        if !resp.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: resp.status().as_u16(),
            });
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(CollaboratorError::decode(SERVICE))?;
        Ok(token.access_token)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<Identity, CollaboratorError> {
        let resp = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(CollaboratorError::request(SERVICE))?;

        if !resp.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: resp.status().as_u16(),
            });
        }

        resp.json()
            .await
            .map_err(CollaboratorError::decode(SERVICE))
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<Url, CollaboratorError> {
        let scope = self.config.scopes.join(" ");
        Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| CollaboratorError::Config {
            service: SERVICE,
            message: format!("authorize_url {}: {e}", self.config.authorize_url),
        })
    }

    async fn exchange(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Identity, CollaboratorError> {
        let access_token = self.fetch_token(code, redirect_uri).await?;
        let identity = self.fetch_userinfo(&access_token).await?;
        tracing::debug!("Identity provider returned user {}", identity.id);
        Ok(identity)
    }
}
