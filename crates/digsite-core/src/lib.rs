pub mod analysis;
pub mod config;
pub mod similarity;
pub mod tier;

pub use analysis::{AnalysisResult, format_elapsed, name_from_description, UNKNOWN_ARTIFACT};
pub use config::{EndpointSource, EndpointSources, InferenceConfig, DEFAULT_ENDPOINT};
pub use similarity::{
    Candidate, CatalogueEntry, FeatureVector, RankedMatches, SimilarityMatch, EMBEDDING_DIM,
};
pub use tier::{BackendConfig, BackendKind, QualityTier, TierError};
