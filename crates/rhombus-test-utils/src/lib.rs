//! Testing utilities for Rhombus workspace
//!
//! Stub collaborators, fixtures, and request builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use rhombus_web::{
    AppState, CollaboratorError, Identity, IdentityProvider, ImageComposer, ServerConfig,
    ThumbnailRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEST_COOKIE: &str = "rhombus_session";
pub const STUB_AUTHORIZE_URL: &str = "https://id.example/authorize";
pub const MULTIPART_BOUNDARY: &str = "rhombus-test-boundary";

/// Identity provider that hands back a fixed identity
#[derive(Debug)]
pub struct StubIdentityProvider {
    identity: Option<Identity>,
    exchanged_codes: Mutex<Vec<String>>,
}

impl StubIdentityProvider {
    pub fn returning(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            exchanged_codes: Mutex::new(Vec::new()),
        }
    }

    /// Every exchange fails with a 500 from the provider
    pub fn failing() -> Self {
        Self {
            identity: None,
            exchanged_codes: Mutex::new(Vec::new()),
        }
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.exchanged_codes.lock().clone()
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<Url, CollaboratorError> {
        Url::parse_with_params(
            STUB_AUTHORIZE_URL,
            &[("state", state), ("redirect_uri", redirect_uri)],
        )
        .map_err(|e| CollaboratorError::Config {
            service: "stub identity provider",
            message: e.to_string(),
        })
    }

    async fn exchange(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<Identity, CollaboratorError> {
        self.exchanged_codes.lock().push(code.to_string());
        self.identity.clone().ok_or(CollaboratorError::Status {
            service: "stub identity provider",
            status: 500,
        })
    }
}

#[derive(Debug, Clone)]
enum ComposeOutcome {
    Image(Vec<u8>),
    Nothing,
    Failure,
}

/// Image composer with a scripted outcome
#[derive(Debug)]
pub struct StubImageComposer {
    outcome: ComposeOutcome,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_image_count: AtomicUsize,
}

impl StubImageComposer {
    fn with_outcome(outcome: ComposeOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_image_count: AtomicUsize::new(0),
        }
    }

    pub fn returning(bytes: Vec<u8>) -> Self {
        Self::with_outcome(ComposeOutcome::Image(bytes))
    }

    /// API answers but produces no image
    pub fn empty() -> Self {
        Self::with_outcome(ComposeOutcome::Nothing)
    }

    /// API call fails
    pub fn failing() -> Self {
        Self::with_outcome(ComposeOutcome::Failure)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }

    pub fn last_image_count(&self) -> usize {
        self.last_image_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageComposer for StubImageComposer {
    async fn compose(
        &self,
        request: &ThumbnailRequest,
    ) -> Result<Option<Vec<u8>>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = Some(request.prompt().to_string());
        self.last_image_count
            .store(request.images().len(), Ordering::SeqCst);

        match &self.outcome {
            ComposeOutcome::Image(bytes) => Ok(Some(bytes.clone())),
            ComposeOutcome::Nothing => Ok(None),
            ComposeOutcome::Failure => Err(CollaboratorError::Status {
                service: "stub image API",
                status: 503,
            }),
        }
    }
}

pub fn test_identity() -> Identity {
    Identity::new("user-1")
        .with_email("tester@example.com")
        .with_name("Test User")
}

pub fn test_config() -> ServerConfig {
    ServerConfig::default().with_bind_addr(([127, 0, 0, 1], 0).into())
}

/// Test harness bundling state and its stub collaborators
pub struct TestApp {
    pub state: Arc<AppState>,
    pub identity: Arc<StubIdentityProvider>,
    pub images: Arc<StubImageComposer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(
            test_config(),
            StubIdentityProvider::returning(test_identity()),
            StubImageComposer::returning(b"\x89PNG-thumb".to_vec()),
        )
    }

    pub fn with(
        config: ServerConfig,
        identity: StubIdentityProvider,
        images: StubImageComposer,
    ) -> Self {
        let identity = Arc::new(identity);
        let images = Arc::new(images);
        let state = AppState::new(config, identity.clone(), images.clone())
            .expect("test config is valid");
        Self {
            state: Arc::new(state),
            identity,
            images,
        }
    }

    /// Start a session directly and return the `Cookie` header for it
    pub fn login(&self) -> String {
        let session = self.state.sessions().create(test_identity());
        format!("{}={}", self.state.config().session_cookie, session)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Multipart body with an optional prompt and `images` file parts
///
/// Returns the `Content-Type` header value and the body.
pub fn multipart_body(prompt: Option<&str>, images: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    if let Some(prompt) = prompt {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"prompt\"\r\n\r\n{prompt}\r\n"
            )
            .as_bytes(),
        );
    }

    for (file_name, bytes) in images {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        body,
    )
}
