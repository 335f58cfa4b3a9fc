//! Image embeddings for similarity search.

use digsite_core::FeatureVector;
use image::DynamicImage;

/// Produces a fixed-length feature vector for an image.
pub trait ImageEmbedder: Send + Sync {
    fn embed(&self, image: &DynamicImage) -> FeatureVector;
}

/// Stand-in until an embedding-capable backend is wired in.
///
/// Always returns the 512-dim zero vector, which keeps ranking callable but
/// scores every candidate 0.0.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderEmbedder;

impl ImageEmbedder for PlaceholderEmbedder {
    fn embed(&self, _image: &DynamicImage) -> FeatureVector {
        FeatureVector::placeholder()
    }
}
