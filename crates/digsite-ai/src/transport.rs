//! Wire transport to an Ollama-compatible inference server.
//!
//! [`Transport`] is one raw call, no retries. Retry policy lives in
//! [`crate::OllamaClient`] so it can be exercised against a scripted transport.

use std::time::Duration;

use async_trait::async_trait;
use digsite_core::InferenceConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TransportError;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// Always `false`: the whole answer arrives as one response body.
    pub stream: bool,
    /// Base64-encoded PNGs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            images: None,
        }
    }

    pub fn with_image(mut self, png_base64: String) -> Self {
        self.images.get_or_insert_with(Vec::new).push(png_base64);
        self
    }
}

/// Only `response` is consumed; other server fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// One generate call, bounded by `timeout`.
    async fn generate(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse, TransportError>;

    /// Names of the models installed on the server.
    async fn list_models(&self, timeout: Duration) -> Result<Vec<String>, TransportError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse, TransportError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(
            url = %url,
            model = %request.model,
            images = request.images.as_ref().map_or(0, Vec::len),
            "posting generate request"
        );

        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }

    async fn list_models(&self, timeout: Duration) -> Result<Vec<String>, TransportError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(url = %url, "listing installed models");

        let resp = self.client.get(&url).timeout(timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = resp.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
