//! Quality tiers and the backend each tier binds to.
//!
//! A tier is a latency/quality tradeoff point. `INSTANT` answers from a local
//! classifier with no network traffic; the three remote tiers ask
//! increasingly capable (and slower) vision-language models.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tier name could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized tier '{0}': expected one of INSTANT, FAST, BALANCED, QUALITY")]
pub struct TierError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityTier {
    Instant,
    Fast,
    Balanced,
    Quality,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Instant, Self::Fast, Self::Balanced, Self::Quality];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instant => "INSTANT",
            Self::Fast => "FAST",
            Self::Balanced => "BALANCED",
            Self::Quality => "QUALITY",
        }
    }

    /// Human-readable latency expectation. Informational only.
    pub fn expected_latency(&self) -> &'static str {
        match self {
            Self::Instant => "1-2 seconds",
            Self::Fast => "20-40 seconds",
            Self::Balanced => "30-60 seconds",
            Self::Quality => "1-2 minutes",
        }
    }

    /// One-line description for tier listings.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Instant => "local classifier, basic classification",
            Self::Fast => "LLaVA 7B, good quality",
            Self::Balanced => "Qwen2-VL 7B, better quality",
            Self::Quality => "Qwen3-VL, best quality",
        }
    }

    /// Pick the best tier that should finish within `max_wait_seconds`.
    pub fn recommend(max_wait_seconds: u64) -> Self {
        match max_wait_seconds {
            0..=5 => Self::Instant,
            6..=45 => Self::Fast,
            46..=90 => Self::Balanced,
            _ => Self::Quality,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only the four canonical names, case-insensitive.
impl FromStr for QualityTier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TierError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    LocalClassifier,
    RemoteGenerative,
}

/// Backend bound to a tier. Built once by the tier catalogue, read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Model identifier on the inference server; `None` for the local classifier.
    pub model: Option<String>,
    pub expected_latency: &'static str,
    /// Upper bound for a single remote call.
    pub timeout: Duration,
    /// Provenance label copied into each result's `method`.
    pub method: String,
}

impl BackendConfig {
    pub fn local(method: impl Into<String>, expected_latency: &'static str) -> Self {
        Self {
            kind: BackendKind::LocalClassifier,
            model: None,
            expected_latency,
            timeout: Duration::ZERO,
            method: method.into(),
        }
    }

    pub fn remote(
        model: impl Into<String>,
        expected_latency: &'static str,
        timeout: Duration,
    ) -> Self {
        let model = model.into();
        Self {
            kind: BackendKind::RemoteGenerative,
            method: format!("Ollama ({model})"),
            model: Some(model),
            expected_latency,
            timeout,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.kind == BackendKind::RemoteGenerative
    }
}
