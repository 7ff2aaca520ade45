//! Per-request identity context
//!
//! - `Identity` as reported by the identity provider
//! - `SessionStore` mapping opaque session ids to identities
//! - `LoginStates` holding single-use OAuth `state` values
//! - `RequestContext` resolved from the session cookie for each request

use crate::error::WebError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a login `state` stays valid
pub const LOGIN_STATE_TTL: Duration = Duration::from_secs(600);

/// How long a session lasts after login unless configured otherwise
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Authenticated user as returned by the provider's userinfo endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-scoped subject id
    pub id: String,
    /// Primary email
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
}

impl Identity {
    /// Create identity with only a subject id
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            picture: None,
        }
    }

    /// With email
    #[inline]
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Best human-readable label: name, then email, then id
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Opaque session identifier (UUID v4, simple form)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a cookie value only if it is a well-formed id
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::try_parse(raw)
            .ok()
            .map(|uuid| Self(uuid.simple().to_string()))
    }

    /// Id as sent in the cookie
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side session table
///
/// Sessions expire `ttl` after login. Expired entries are swept whenever a
/// new session starts.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<SessionId, (Identity, Instant)>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    /// Create empty store with the default lifetime
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty store whose sessions last `ttl`
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Session lifetime
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `identity`
    pub fn create(&self, identity: Identity) -> SessionId {
        let now = Instant::now();
        self.sessions
            .retain(|_, (_, started)| now.duration_since(*started) < self.ttl);
        let id = SessionId::generate();
        self.sessions.insert(id.clone(), (identity, now));
        id
    }

    /// Identity bound to `id`, if the session is live
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<Identity> {
        let identity = self
            .sessions
            .get(id)
            .filter(|entry| entry.value().1.elapsed() < self.ttl)
            .map(|entry| entry.value().0.clone());
        if identity.is_none() {
            self.sessions.remove(id);
        }
        identity
    }

    /// End a session
    pub fn remove(&self, id: &SessionId) -> Option<Identity> {
        self.sessions.remove(id).map(|(_, (identity, _))| identity)
    }

    /// Number of live sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Pending OAuth `state` values awaiting the provider callback
#[derive(Debug, Default)]
pub struct LoginStates {
    pending: DashMap<String, Instant>,
}

impl LoginStates {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new single-use state value
    pub fn issue(&self) -> String {
        let now = Instant::now();
        self.pending
            .retain(|_, issued| now.duration_since(*issued) < LOGIN_STATE_TTL);
        let state = Uuid::new_v4().simple().to_string();
        self.pending.insert(state.clone(), now);
        state
    }

    /// Consume `state`; true only for a known, unexpired value
    pub fn consume(&self, state: &str) -> bool {
        self.pending
            .remove(state)
            .is_some_and(|(_, issued)| issued.elapsed() < LOGIN_STATE_TTL)
    }
}

/// Identity context for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Session id from the cookie, if it names a live session
    pub session_id: Option<SessionId>,
    /// Identity bound to that session
    pub identity: Option<Identity>,
}

impl RequestContext {
    /// Context with no identity
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve from a raw `Cookie` header
    #[must_use]
    pub fn resolve(store: &SessionStore, cookie_name: &str, cookie_header: Option<&str>) -> Self {
        let Some(session_id) = cookie_header
            .and_then(|header| cookie_value(header, cookie_name))
            .and_then(SessionId::parse)
        else {
            return Self::anonymous();
        };

        match store.get(&session_id) {
            Some(identity) => Self {
                session_id: Some(session_id),
                identity: Some(identity),
            },
            None => Self::anonymous(),
        }
    }

    /// Whether an identity is present
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The identity, or `Unauthorized`
    ///
    /// # Errors
    /// - `WebError::Unauthorized` if the request carries no live session
    pub fn require_identity(&self) -> Result<&Identity, WebError> {
        self.identity.as_ref().ok_or(WebError::Unauthorized)
    }
}

/// Value of cookie `name` in a `Cookie` header
#[must_use]
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// `Set-Cookie` value binding `session`
#[must_use]
pub fn session_cookie(name: &str, session: &SessionId) -> String {
    format!("{name}={session}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value clearing the session
#[must_use]
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
