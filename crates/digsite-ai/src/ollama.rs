//! Retrying client for Ollama's generate API.
//!
//! Timeouts and refused connections are retried with exponential backoff
//! (`base * 2^attempt`); HTTP error statuses and anything unexpected fail on
//! the first attempt.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use digsite_core::InferenceConfig;
use image::{DynamicImage, ImageFormat};
use tracing::{error, warn};

use crate::transport::{GenerateRequest, HttpTransport, Transport};
use crate::{AnalysisError, TransportError};

pub struct OllamaClient {
    transport: Arc<dyn Transport>,
    max_retries: u32,
    base_delay: Duration,
}

impl OllamaClient {
    pub fn new(transport: Arc<dyn Transport>, config: &InferenceConfig) -> Self {
        Self {
            transport,
            max_retries: config.max_retries.max(1),
            base_delay: config.retry_base_delay,
        }
    }

    /// Client talking HTTP to `config.endpoint`.
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(Arc::new(HttpTransport::new(config)), config)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before the retry that follows 0-based `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Generate text from `model`, optionally conditioned on `image`.
    ///
    /// The image is sent as a base64 PNG. Streaming is disabled, so the full
    /// answer is awaited in one response.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&DynamicImage>,
        timeout: Duration,
    ) -> Result<String, AnalysisError> {
        if prompt.trim().is_empty() {
            return Err(AnalysisError::EmptyPrompt);
        }

        let mut request = GenerateRequest::new(model, prompt);
        if let Some(image) = image {
            request = request.with_image(encode_png_base64(image)?);
        }

        let mut last_transient = None;
        for attempt in 0..self.max_retries {
            match self.transport.generate(&request, timeout).await {
                Ok(resp) => return Ok(resp.response),
                Err(e) if e.is_transient() => {
                    warn!(
                        model,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "transient inference failure"
                    );
                    last_transient = Some(e);
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.backoff_delay(attempt)).await;
                    }
                }
                Err(e) => {
                    error!(model, attempt = attempt + 1, error = %e, "inference request failed");
                    return Err(AnalysisError::Backend(e));
                }
            }
        }

        let source = last_transient
            .unwrap_or_else(|| TransportError::Other("no attempt was made".into()));
        error!(
            model,
            attempts = self.max_retries,
            error = %source,
            "generation failed, retries exhausted"
        );
        Err(AnalysisError::GenerationFailed {
            attempts: self.max_retries,
            source,
        })
    }

    /// Whether `model` (or another tag of its family) is installed. One attempt, no retry.
    pub async fn has_model(&self, model: &str, timeout: Duration) -> Result<bool, TransportError> {
        let installed = self.transport.list_models(timeout).await?;
        Ok(model_installed(&installed, model))
    }
}

/// Exact tag match, or same family (`llava` for `llava:7b`).
pub fn model_installed(installed: &[String], model: &str) -> bool {
    let family = |name: &str| name.split(':').next().unwrap_or(name).to_ascii_lowercase();
    let wanted = family(model);
    installed
        .iter()
        .any(|m| m.eq_ignore_ascii_case(model) || family(m) == wanted)
}

/// Encode `image` losslessly as PNG, then base64.
pub fn encode_png_base64(image: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(STANDARD.encode(buf.into_inner()))
}
