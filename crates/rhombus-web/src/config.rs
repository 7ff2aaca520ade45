//! Server configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment:
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - identity provider credentials
//! - `IMAGE_API_KEY` - image API bearer key
//! - `RHOMBUS_BIND` - listen address
//! - `RHOMBUS_PUBLIC_URL` - externally visible base URL

use crate::error::ConfigError;
use crate::session::DEFAULT_SESSION_TTL;
use chrono::FixedOffset;
use rhombus_pattern::{Word, DEFAULT_WORD};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Minutes east of UTC for Asia/Kolkata
pub const IST_OFFSET_MINUTES: i32 = 330;

/// Default cap on requested pattern lines
pub const DEFAULT_MAX_LINES: u64 = 1001;

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: SocketAddr,
    /// Base URL the browser reaches us on (used for the OAuth redirect)
    pub public_url: String,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Name of the session cookie
    pub session_cookie: String,
    /// Session lifetime after login, in seconds
    pub session_ttl_secs: u64,
    /// Offset used when showing the current time on the home route
    pub display_utc_offset_minutes: i32,
    /// Upper bound on requested pattern lines (`None` lifts the cap)
    pub max_lines: Option<u64>,
    /// Glyph source for the diamond
    pub word: String,
    /// Identity provider settings
    pub oauth: OAuthConfig,
    /// Image API settings
    pub image: ImageApiConfig,
}

impl ServerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With listen address
    #[inline]
    #[must_use]
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// With public base URL
    #[inline]
    #[must_use]
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }

    /// With pattern line cap
    #[inline]
    #[must_use]
    pub fn with_max_lines(mut self, max: Option<u64>) -> Self {
        self.max_lines = max;
        self
    }

    /// With glyph word
    #[inline]
    #[must_use]
    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.word = word.into();
        self
    }

    /// Parse from TOML text; missing keys take defaults
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or wrong value types
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from an optional file, apply process environment, validate
    ///
    /// # Errors
    /// - `ConfigError::Read` if `path` cannot be read
    /// - `ConfigError::Parse` / `ConfigError::Invalid` as for the parsing steps
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if `RHOMBUS_BIND` is not a socket address
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(id) = lookup("GOOGLE_CLIENT_ID") {
            self.oauth.client_id = id;
        }
        if let Some(secret) = lookup("GOOGLE_CLIENT_SECRET") {
            self.oauth.client_secret = secret;
        }
        if let Some(key) = lookup("IMAGE_API_KEY") {
            self.image.api_key = key;
        }
        if let Some(url) = lookup("RHOMBUS_PUBLIC_URL") {
            self.public_url = url;
        }
        if let Some(bind) = lookup("RHOMBUS_BIND") {
            self.bind_addr = bind
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("RHOMBUS_BIND={bind}: {e}")))?;
        }
        Ok(self)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// - `ConfigError::Invalid` describing the first offending value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.word()?;
        self.display_offset()?;
        if self.max_lines == Some(0) {
            return Err(ConfigError::Invalid("max_lines must be positive".to_string()));
        }
        if self.session_cookie.is_empty()
            || !self
                .session_cookie
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid(format!(
                "session_cookie {:?} is not a valid cookie name",
                self.session_cookie
            )));
        }
        reqwest::Url::parse(&self.public_url)
            .map_err(|e| ConfigError::Invalid(format!("public_url {}: {e}", self.public_url)))?;
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid("session_ttl_secs must be positive".to_string()));
        }
        if self.image.timeout_secs == 0 {
            return Err(ConfigError::Invalid("image.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Configured glyph word
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if the word is empty
    pub fn word(&self) -> Result<Word, ConfigError> {
        Word::new(self.word.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Configured display offset
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if the offset is a day or more
    pub fn display_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.display_utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "display_utc_offset_minutes {} is out of range",
                self.display_utc_offset_minutes
            ))
        })
    }

    /// Session lifetime
    #[inline]
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Callback URL registered with the identity provider
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth", self.public_url.trim_end_matches('/'))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            public_url: "http://127.0.0.1:5000".to_string(),
            log_filter: "info".to_string(),
            log_json: false,
            session_cookie: "rhombus_session".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            display_utc_offset_minutes: IST_OFFSET_MINUTES,
            max_lines: Some(DEFAULT_MAX_LINES),
            word: DEFAULT_WORD.to_string(),
            oauth: OAuthConfig::default(),
            image: ImageApiConfig::default(),
        }
    }
}

/// OAuth 2.0 identity provider settings (Google by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Client identifier
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Browser authorization endpoint
    pub authorize_url: String,
    /// Code-for-token endpoint
    pub token_url: String,
    /// Profile endpoint
    pub userinfo_url: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OAuthConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorize_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: vec!["email".to_string(), "profile".to_string()],
            timeout_secs: 10,
        }
    }
}

/// Generative image API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageApiConfig {
    /// Multipart edit endpoint
    pub endpoint: String,
    /// Bearer key
    pub api_key: String,
    /// Model name sent with each request
    pub model: String,
    /// Output size hint sent with each request
    pub size: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ImageApiConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/images/edits".to_string(),
            api_key: String::new(),
            model: "dall-e-2".to_string(),
            size: "256x256".to_string(),
            timeout_secs: 60,
        }
    }
}
