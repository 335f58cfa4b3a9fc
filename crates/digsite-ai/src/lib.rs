//! Artifact analysis: tier dispatch over a local classifier and Ollama vision models,
//! plus similarity ranking of catalogue embeddings.

pub mod analyzer;
pub mod catalogue;
pub mod classifier;
pub mod embedder;
mod error;
pub mod ollama;
pub mod similarity;
pub mod transport;

#[cfg(test)]
mod testing;

pub use analyzer::Analyzer;
pub use catalogue::TierCatalogue;
pub use classifier::{LocalClassifier, PaletteClassifier};
pub use embedder::{ImageEmbedder, PlaceholderEmbedder};
pub use error::{AnalysisError, TransportError};
pub use ollama::OllamaClient;
pub use similarity::{cosine_similarity, rank};
pub use transport::{HttpTransport, Transport};
