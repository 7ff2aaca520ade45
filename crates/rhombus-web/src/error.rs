//! Error types for the Rhombus boundary layer
//!
//! - Request failures surfaced to HTTP callers
//! - Collaborator (identity provider, image API) failures
//! - Configuration loading failures

use rhombus_pattern::PatternError;
use std::path::PathBuf;
use warp::http::StatusCode;

/// Failure surfaced to an HTTP caller
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Malformed or out-of-range caller input
    #[error("{0}")]
    InvalidInput(String),

    /// No authenticated identity on the request
    #[error("unauthorized: please log in first")]
    Unauthorized,

    /// Collaborator or server failure
    #[error("internal error: {0}")]
    Internal(String),

    /// Image collaborator answered without an image
    #[error("no thumbnail was generated")]
    NoResult,
}

impl WebError {
    /// HTTP status for this error
    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) | Self::NoResult => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for `InvalidInput`
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl warp::reject::Reject for WebError {}

impl From<PatternError> for WebError {
    fn from(err: PatternError) -> Self {
        if err.is_invalid_input() {
            Self::InvalidInput(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<CollaboratorError> for WebError {
    fn from(err: CollaboratorError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Remote collaborator failures
///
/// Never retried; wrapped into `WebError::Internal` at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// Transport-level failure
    #[error("{service} request failed: {source}")]
    Request {
        /// Collaborator name
        service: &'static str,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{service} returned status {status}")]
    Status {
        /// Collaborator name
        service: &'static str,
        /// Status code received
        status: u16,
    },

    /// Response body did not match the expected shape
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        /// Collaborator name
        service: &'static str,
        /// Decoder message
        message: String,
    },

    /// Collaborator is misconfigured
    #[error("{service} is misconfigured: {message}")]
    Config {
        /// Collaborator name
        service: &'static str,
        /// What is wrong
        message: String,
    },
}

impl CollaboratorError {
    /// Map a client error for `service`
    #[inline]
    pub(crate) fn request(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Request { service, source }
    }

    /// Map a decode error for `service`
    #[inline]
    pub(crate) fn decode(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |err| Self::Decode {
            service,
            message: err.to_string(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or malformed
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Server start-up errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Collaborator client could not be built
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// Listener could not be bound
    #[error("failed to bind listener: {0}")]
    Bind(#[from] warp::Error),
}
