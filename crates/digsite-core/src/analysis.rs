//! The uniform analysis record returned for every tier.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::similarity::FeatureVector;
use crate::tier::QualityTier;

/// Name used when a backend produced no usable text.
pub const UNKNOWN_ARTIFACT: &str = "Unknown artifact";

/// Structured result of one analysis.
///
/// Created once per request and handed to the caller, who persists or
/// discards it. `method` and `tier` record which backend answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub description: String,
    /// Placeholder in [0, 1]: no backend reports a native confidence.
    pub confidence: f32,
    pub method: String,
    pub tier: QualityTier,
    /// Elapsed wall-clock, e.g. `"1.3s"`.
    pub analysis_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<FeatureVector>,
    pub analyzed_at: DateTime<Utc>,
}

/// Format an elapsed duration as seconds with one decimal, e.g. `"12.4s"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

/// Short artifact name from generated text: everything before the first period.
///
/// Empty or punctuation-only text yields [`UNKNOWN_ARTIFACT`].
pub fn name_from_description(description: &str) -> String {
    let first = description.split('.').next().unwrap_or_default().trim();
    if first.is_empty() {
        UNKNOWN_ARTIFACT.to_string()
    } else {
        first.to_string()
    }
}
