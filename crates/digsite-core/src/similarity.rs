//! Feature vectors and similarity-match types shared by the scorer and callers.

use serde::{Deserialize, Serialize};

/// Dimensionality of catalogue feature vectors.
pub const EMBEDDING_DIM: usize = 512;

/// Fixed-length image feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    /// The all-zero vector stored until an embedding model is wired in.
    pub fn placeholder() -> Self {
        Self(vec![0.0; EMBEDDING_DIM])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// A catalogue row as handed to the scorer. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Candidate {
    pub fn new(id: i64, name: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            embedding: Some(embedding),
        }
    }
}

/// Identity of a ranked catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub entry: CatalogueEntry,
    /// Cosine similarity in [-1, 1]; 0.0 when either vector has zero norm.
    pub score: f32,
}

/// Top match plus up to three runners-up, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatches {
    pub best: SimilarityMatch,
    pub alternatives: Vec<SimilarityMatch>,
}
