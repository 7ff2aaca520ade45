//! Image-composition collaborator
//!
//! Sends 1-5 source images and a prompt to a generative image API and returns
//! the composed thumbnail bytes, or `None` when the API produced nothing.

use crate::config::ImageApiConfig;
use crate::error::{CollaboratorError, WebError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const SERVICE: &str = "image API";

/// Most images accepted per thumbnail request
pub const MAX_IMAGES: usize = 5;

/// One uploaded source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Original file name
    pub file_name: String,
    /// MIME type as uploaded
    pub content_type: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// Create image input
    #[inline]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Validated thumbnail request
#[derive(Debug, Clone)]
pub struct ThumbnailRequest {
    images: Vec<ImageInput>,
    prompt: String,
}

impl ThumbnailRequest {
    /// Validate image count and prompt
    ///
    /// # Errors
    /// - `WebError::InvalidInput` for zero or more than `MAX_IMAGES` images,
    ///   or a blank prompt
    pub fn new(images: Vec<ImageInput>, prompt: impl Into<String>) -> Result<Self, WebError> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(WebError::invalid("prompt must not be empty"));
        }
        if images.is_empty() || images.len() > MAX_IMAGES {
            return Err(WebError::invalid(format!(
                "expected 1 to {MAX_IMAGES} images, got {}",
                images.len()
            )));
        }
        Ok(Self { images, prompt })
    }

    /// Source images
    #[inline]
    #[must_use]
    pub fn images(&self) -> &[ImageInput] {
        &self.images
    }

    /// Trimmed prompt
    #[inline]
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Image composition seam
#[async_trait]
pub trait ImageComposer: Send + Sync {
    /// Compose a thumbnail; `Ok(None)` means the API returned no image
    ///
    /// # Errors
    /// - Any `CollaboratorError` from the remote call
    async fn compose(&self, request: &ThumbnailRequest)
        -> Result<Option<Vec<u8>>, CollaboratorError>;
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
}

/// Multipart image-edit client over reqwest
#[derive(Debug, Clone)]
pub struct HttpImageComposer {
    client: reqwest::Client,
    config: ImageApiConfig,
}

impl HttpImageComposer {
    /// Build client from config
    ///
    /// # Errors
    /// - `CollaboratorError::Request` if the HTTP client cannot be built
    pub fn new(config: ImageApiConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(CollaboratorError::request(SERVICE))?;
        Ok(Self { client, config })
    }

    fn form(&self, request: &ThumbnailRequest) -> Result<Form, CollaboratorError> {
        let mut form = Form::new()
            .text("model", self.config.model.clone())
            .text("prompt", request.prompt().to_string())
            .text("size", self.config.size.clone())
            .text("n", "1")
            .text("response_format", "url");

        for image in request.images() {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .map_err(|e| CollaboratorError::Config {
                    service: SERVICE,
                    message: format!("content type {:?}: {e}", image.content_type),
                })?;
            form = form.part("image[]", part);
        }
        Ok(form)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, CollaboratorError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CollaboratorError::request(SERVICE))?;

        if !resp.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: resp.status().as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(CollaboratorError::request(SERVICE))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageComposer for HttpImageComposer {
    async fn compose(
        &self,
        request: &ThumbnailRequest,
    ) -> Result<Option<Vec<u8>>, CollaboratorError> {
        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .multipart(self.form(request)?)
            .send()
            .await
            .map_err(CollaboratorError::request(SERVICE))?;

        if !resp.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: resp.status().as_u16(),
            });
        }

        let body: ImagesResponse = resp
            .json()
            .await
            .map_err(CollaboratorError::decode(SERVICE))?;

        let Some(url) = body.data.into_iter().find_map(|datum| datum.url) else {
            tracing::warn!("Image API returned no image for {} inputs", request.images().len());
            return Ok(None);
        };

        let bytes = self.download(&url).await?;
        Ok((!bytes.is_empty()).then_some(bytes))
    }
}
