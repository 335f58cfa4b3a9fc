//! Tier dispatch: one image in, one [`AnalysisResult`] out, whichever backend answers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use digsite_core::{
    AnalysisResult, BackendConfig, InferenceConfig, QualityTier, UNKNOWN_ARTIFACT, format_elapsed,
    name_from_description,
};
use futures::StreamExt;
use image::DynamicImage;
use tracing::{error, info, warn};

use crate::catalogue::TierCatalogue;
use crate::classifier::{LocalClassifier, PaletteClassifier};
use crate::embedder::{ImageEmbedder, PlaceholderEmbedder};
use crate::{AnalysisError, OllamaClient};

// ── Prompt templates ──

/// Sent to the local classifier.
pub const CLASSIFY_PROMPT: &str = "Provide a short, descriptive name for the object in the image.";

/// `FAST`: short prompt, short answer.
pub const FAST_PROMPT: &str = "Briefly identify this artifact in 2-3 sentences: \
type, material, approximate age, and cultural origin.";

/// `BALANCED` and `QUALITY`.
pub const DETAILED_PROMPT: &str = "You are an expert archaeologist. Analyze the image carefully \
and describe the artifact: its type, material, age, cultural origin, and possible historical \
function in 2-3 sentences.";

/// Placeholder confidences: neither backend reports one natively.
pub const LOCAL_CONFIDENCE: f32 = 1.0;
pub const REMOTE_CONFIDENCE: f32 = 0.85;

/// Analyses in flight at once during a batch.
const BATCH_CONCURRENCY: usize = 4;

/// Readiness probes should answer fast or not at all.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend output before timing and provenance are attached.
struct Draft {
    name: String,
    description: String,
    confidence: f32,
}

pub struct Analyzer {
    catalogue: TierCatalogue,
    client: OllamaClient,
    classifier: Arc<dyn LocalClassifier>,
    embedder: Arc<dyn ImageEmbedder>,
}

impl Analyzer {
    /// Analyzer with the default palette classifier and placeholder embedder.
    pub fn new(catalogue: TierCatalogue, client: OllamaClient) -> Self {
        Self {
            catalogue,
            client,
            classifier: Arc::new(PaletteClassifier::default()),
            embedder: Arc::new(PlaceholderEmbedder),
        }
    }

    /// HTTP-backed analyzer for `config.endpoint`.
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(
            TierCatalogue::new(config.timeout),
            OllamaClient::from_config(config),
        )
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn LocalClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn ImageEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn catalogue(&self) -> &TierCatalogue {
        &self.catalogue
    }

    pub fn embedder(&self) -> &dyn ImageEmbedder {
        self.embedder.as_ref()
    }

    /// Prompt sent to the backend of `tier`.
    pub fn prompt_for(tier: QualityTier) -> &'static str {
        match tier {
            QualityTier::Instant => CLASSIFY_PROMPT,
            QualityTier::Fast => FAST_PROMPT,
            QualityTier::Balanced | QualityTier::Quality => DETAILED_PROMPT,
        }
    }

    /// Analyze `image` on the backend bound to `tier`.
    ///
    /// Retry-exhaustion and backend errors are returned as-is after logging
    /// the elapsed time; picking another tier is the caller's decision.
    pub async fn analyze(
        &self,
        image: &DynamicImage,
        tier: QualityTier,
    ) -> Result<AnalysisResult, AnalysisError> {
        let backend = self.catalogue.resolve(tier);
        let start = Instant::now();

        let outcome = match backend.model.as_deref() {
            None => self.run_local(image),
            Some(model) => self.run_remote(image, tier, model, backend).await,
        };
        let elapsed = format_elapsed(start.elapsed());

        match outcome {
            Ok(draft) => {
                info!(
                    tier = %tier,
                    method = %backend.method,
                    elapsed = %elapsed,
                    "analysis complete"
                );
                Ok(AnalysisResult {
                    name: draft.name,
                    description: draft.description,
                    confidence: draft.confidence,
                    method: backend.method.clone(),
                    tier,
                    analysis_time: elapsed,
                    embedding: Some(self.embedder.embed(image)),
                    analyzed_at: Utc::now(),
                })
            }
            Err(e) => {
                error!(tier = %tier, elapsed = %elapsed, error = %e, "analysis failed");
                Err(e)
            }
        }
    }

    /// Like [`analyze`](Self::analyze) with the tier given by name.
    ///
    /// Unknown names fail before any backend is touched.
    pub async fn analyze_named(
        &self,
        image: &DynamicImage,
        tier: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let (tier, _) = self.catalogue.resolve_name(tier)?;
        self.analyze(image, tier).await
    }

    /// Analyze several images on one tier, a few at a time.
    ///
    /// Returns one result per image in input order; a failure does not stop
    /// the rest.
    pub async fn analyze_batch(
        &self,
        images: &[DynamicImage],
        tier: QualityTier,
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        info!(tier = %tier, count = images.len(), "starting batch analysis");
        futures::stream::iter(images.iter().map(|image| self.analyze(image, tier)))
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await
    }

    /// Whether `tier` can currently be served.
    ///
    /// The local tier is always ready; remote tiers ask the server which
    /// models are installed (single attempt, short timeout).
    pub async fn is_backend_ready(&self, tier: QualityTier) -> bool {
        let backend = self.catalogue.resolve(tier);
        let Some(model) = backend.model.as_deref() else {
            return true;
        };
        match self.client.has_model(model, PROBE_TIMEOUT).await {
            Ok(installed) => installed,
            Err(e) => {
                warn!(tier = %tier, model, error = %e, "backend readiness probe failed");
                false
            }
        }
    }

    fn run_local(&self, image: &DynamicImage) -> Result<Draft, AnalysisError> {
        let label = self.classifier.classify(image, CLASSIFY_PROMPT)?;
        let name = match label.trim() {
            "" => UNKNOWN_ARTIFACT.to_string(),
            l => l.to_string(),
        };
        Ok(Draft {
            description: format!("Classified as: {name}"),
            name,
            confidence: LOCAL_CONFIDENCE,
        })
    }

    async fn run_remote(
        &self,
        image: &DynamicImage,
        tier: QualityTier,
        model: &str,
        backend: &BackendConfig,
    ) -> Result<Draft, AnalysisError> {
        let text = self
            .client
            .generate(model, Self::prompt_for(tier), Some(image), backend.timeout)
            .await?;
        let description = text.trim().to_string();
        Ok(Draft {
            name: name_from_description(&description),
            description,
            confidence: REMOTE_CONFIDENCE,
        })
    }
}
