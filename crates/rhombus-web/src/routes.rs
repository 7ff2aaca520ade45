//! HTTP routes
//!
//! Every route receives the shared [`AppState`] and, where identity matters,
//! a [`RequestContext`] resolved from the session cookie. Handler failures
//! are `WebError` rejections turned into short text replies by
//! [`handle_rejection`].

use crate::config::ServerConfig;
use crate::error::{ConfigError, WebError};
use crate::identity::IdentityProvider;
use crate::images::{ImageComposer, ImageInput, ThumbnailRequest, MAX_IMAGES};
use crate::input::{parse_lines, LINES_FIELD};
use crate::session::{
    expired_cookie, session_cookie, Identity, LoginStates, RequestContext, SessionStore,
};
use chrono::{FixedOffset, Utc};
use futures::TryStreamExt;
use rhombus_pattern::PatternGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use warp::http::{header, Response, StatusCode, Uri};
use warp::hyper::body::Buf;
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

/// Largest accepted url-encoded form body
pub const MAX_FORM_BYTES: u64 = 16 * 1024;

/// Largest accepted multipart upload
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shared state handed to every route
pub struct AppState {
    config: ServerConfig,
    generator: PatternGenerator,
    offset: FixedOffset,
    sessions: SessionStore,
    login_states: LoginStates,
    identity: Arc<dyn IdentityProvider>,
    images: Arc<dyn ImageComposer>,
}

impl AppState {
    /// Assemble state from validated config and collaborators
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if `config` fails validation
    pub fn new(
        config: ServerConfig,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageComposer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            generator: PatternGenerator::new(config.word()?),
            offset: config.display_offset()?,
            sessions: SessionStore::with_ttl(config.session_ttl()),
            config,
            login_states: LoginStates::new(),
            identity,
            images,
        })
    }

    /// Server configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Session table
    #[inline]
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Pending login states
    #[inline]
    #[must_use]
    pub fn login_states(&self) -> &LoginStates {
        &self.login_states
    }

    /// Pattern generator over the configured word
    #[inline]
    #[must_use]
    pub fn generator(&self) -> &PatternGenerator {
        &self.generator
    }

    /// Wall-clock time at the configured display offset
    #[must_use]
    pub fn current_time(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .format(TIME_FORMAT)
            .to_string()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("generator", &self.generator)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeView {
    /// Whether the caller has a live session
    pub authenticated: bool,
    /// The caller, if logged in
    pub user: Option<Identity>,
    /// Current time at the display offset, if logged in
    pub current_time: Option<String>,
}

/// Body of a successful `POST /pattern`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternResponse {
    /// Rendered diamond, rows joined by `\n`
    pub pattern: String,
    /// Line count as submitted
    pub lines: i64,
    /// Rows actually rendered
    pub rows: usize,
    /// Width of each row
    pub width: usize,
}

/// Query of the identity provider callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthQuery {
    /// Authorization code
    pub code: Option<String>,
    /// State issued by `/login`
    pub state: Option<String>,
    /// Provider-reported failure
    pub error: Option<String>,
}

/// All routes, with request tracing and rejection recovery
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let home = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_context(state.clone()))
        .map(home);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(login);

    let auth = warp::path("auth")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(warp::query::<AuthQuery>())
        .and_then(auth);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_context(state.clone()))
        .map(logout);

    let pattern = warp::path("pattern")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::form::<HashMap<String, String>>())
        .and_then(pattern);

    let thumbnail = warp::path("thumbnail")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_identity(state))
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and_then(thumbnail);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| "ok");

    home.or(login)
        .or(auth)
        .or(logout)
        .or(pattern)
        .or(thumbnail)
        .or(health)
        .with(warp::trace::request())
        .recover(handle_rejection)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_context(
    state: Arc<AppState>,
) -> impl Filter<Extract = (RequestContext,), Error = Rejection> + Clone {
    warp::header::optional::<String>("cookie").map(move |cookie: Option<String>| {
        RequestContext::resolve(
            &state.sessions,
            &state.config.session_cookie,
            cookie.as_deref(),
        )
    })
}

/// Authenticated identity, checked before any body filter runs
fn with_identity(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    with_context(state).and_then(|ctx: RequestContext| async move {
        ctx.identity.ok_or_else(|| reject(WebError::Unauthorized))
    })
}

fn reject(err: WebError) -> Rejection {
    warp::reject::custom(err)
}

fn redirect_home() -> impl Reply {
    warp::redirect::see_other(Uri::from_static("/"))
}

fn home(state: Arc<AppState>, ctx: RequestContext) -> impl Reply {
    let current_time = ctx.identity.as_ref().map(|_| state.current_time());
    warp::reply::json(&HomeView {
        authenticated: ctx.is_authenticated(),
        user: ctx.identity,
        current_time,
    })
}

async fn login(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    begin_login(&state).map_err(reject)
}

fn begin_login(state: &AppState) -> Result<impl Reply, WebError> {
    let login_state = state.login_states.issue();
    let url = state
        .identity
        .authorize_url(&login_state, &state.config.redirect_uri())?;
    let target: Uri = url
        .as_str()
        .parse()
        .map_err(|e| WebError::Internal(format!("redirect target {url}: {e}")))?;
    tracing::debug!("Redirecting to identity provider");
    Ok(warp::redirect::see_other(target))
}

async fn auth(state: Arc<AppState>, query: AuthQuery) -> Result<impl Reply, Rejection> {
    complete_login(&state, query).await.map_err(reject)
}

async fn complete_login(state: &AppState, query: AuthQuery) -> Result<impl Reply, WebError> {
    if let Some(error) = query.error {
        tracing::warn!("Identity provider reported: {}", error);
        return Err(WebError::invalid(format!("login failed: {error}")));
    }

    let login_state = query
        .state
        .ok_or_else(|| WebError::invalid("missing login state"))?;
    if !state.login_states.consume(&login_state) {
        return Err(WebError::invalid("unknown or expired login state"));
    }

    let code = query
        .code
        .ok_or_else(|| WebError::invalid("missing authorization code"))?;

    let identity = state
        .identity
        .exchange(&code, &state.config.redirect_uri())
        .await
        .map_err(|e| {
            tracing::error!("Login exchange failed: {}", e);
            WebError::from(e)
        })?;

    tracing::info!("User {} logged in", identity.display_name());
    let session = state.sessions.create(identity);

    Ok(warp::reply::with_header(
        redirect_home(),
        header::SET_COOKIE,
        session_cookie(&state.config.session_cookie, &session),
    ))
}

fn logout(state: Arc<AppState>, ctx: RequestContext) -> impl Reply {
    if let Some(identity) = ctx
        .session_id
        .as_ref()
        .and_then(|id| state.sessions.remove(id))
    {
        tracing::info!("User {} logged out", identity.display_name());
    }

    warp::reply::with_header(
        redirect_home(),
        header::SET_COOKIE,
        expired_cookie(&state.config.session_cookie),
    )
}

async fn pattern(
    state: Arc<AppState>,
    identity: Identity,
    form: HashMap<String, String>,
) -> Result<impl Reply, Rejection> {
    render_pattern(state, &identity, &form)
        .await
        .map(|body| warp::reply::json(&body))
        .map_err(reject)
}

async fn render_pattern(
    state: Arc<AppState>,
    identity: &Identity,
    form: &HashMap<String, String>,
) -> Result<PatternResponse, WebError> {
    let lines = parse_lines(
        form.get(LINES_FIELD).map(String::as_str),
        state.config.max_lines,
    )?;

    // layout is CPU-bound and grows with lines squared
    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || worker.generator.generate(lines))
        .await
        .map_err(|e| WebError::Internal(format!("pattern task failed: {e}")))??;

    tracing::info!(
        user = %identity.id,
        lines,
        rows = result.effective_lines(),
        "Rendered pattern"
    );

    Ok(PatternResponse {
        pattern: result.text(),
        lines,
        rows: result.effective_lines(),
        width: result.max_width(),
    })
}

async fn thumbnail(
    state: Arc<AppState>,
    identity: Identity,
    form: FormData,
) -> Result<impl Reply, Rejection> {
    compose_thumbnail(&state, &identity, form).await.map_err(reject)
}

async fn compose_thumbnail(
    state: &AppState,
    identity: &Identity,
    form: FormData,
) -> Result<Response<Vec<u8>>, WebError> {
    let upload = read_upload(form).await?;
    let request = ThumbnailRequest::new(upload.images, upload.prompt.unwrap_or_default())?;

    let image = state
        .images
        .compose(&request)
        .await
        .map_err(|e| {
            tracing::error!("Thumbnail generation failed: {}", e);
            WebError::from(e)
        })?
        .ok_or(WebError::NoResult)?;

    tracing::info!(
        user = %identity.id,
        inputs = request.images().len(),
        bytes = image.len(),
        "Composed thumbnail"
    );

    Response::builder()
        .header(header::CONTENT_TYPE, "image/png")
        .body(image)
        .map_err(|e| WebError::Internal(e.to_string()))
}

#[derive(Debug, Default)]
struct Upload {
    prompt: Option<String>,
    images: Vec<ImageInput>,
}

async fn read_upload(form: FormData) -> Result<Upload, WebError> {
    futures::pin_mut!(form);
    let mut upload = Upload::default();

    while let Some(part) = form.try_next().await.map_err(malformed)? {
        let name = part.name().to_string();
        let file_name = part.filename().unwrap_or(&name).to_string();
        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = read_part(part).await?;

        match name.as_str() {
            "prompt" => {
                let prompt = String::from_utf8(bytes)
                    .map_err(|_| WebError::invalid("prompt must be UTF-8 text"))?;
                upload.prompt = Some(prompt);
            }
            // browsers send an empty part when no file was picked
            "images" | "image" if bytes.is_empty() => {}
            "images" | "image" => {
                if upload.images.len() == MAX_IMAGES {
                    return Err(WebError::invalid(format!(
                        "expected 1 to {MAX_IMAGES} images, got more"
                    )));
                }
                upload
                    .images
                    .push(ImageInput::new(file_name, content_type, bytes));
            }
            other => tracing::debug!("Ignoring upload field {}", other),
        }
    }

    Ok(upload)
}

async fn read_part(part: Part) -> Result<Vec<u8>, WebError> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(chunk.chunk());
            Ok(acc)
        })
        .await
        .map_err(malformed)
}

fn malformed(err: warp::Error) -> WebError {
    WebError::invalid(format!("malformed upload: {err}"))
}

/// Map any rejection to a status and short text body
///
/// # Errors
/// Never fails; the `Result` satisfies warp's `recover` contract.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<WebError>() {
        if e.status().is_server_error() {
            tracing::error!("Request failed: {}", e);
        } else {
            tracing::warn!("Request rejected: {}", e);
        }
        (e.status(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(message) = body_shape_message(&err) {
        tracing::warn!("Request rejected: {}", message);
        (StatusCode::BAD_REQUEST, message.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };

    Ok(warp::reply::with_status(message, status))
}

/// Malformed request framing: all caller errors, reported as 400
fn body_shape_message(err: &Rejection) -> Option<&'static str> {
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        Some("request body too large")
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        Some("malformed form body")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        Some("malformed query string")
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        Some("unsupported content type")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        Some("content length required")
    } else if err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
    {
        Some("missing or malformed request header")
    } else {
        None
    }
}
