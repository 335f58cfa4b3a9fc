//! Local, network-free classification for the `INSTANT` tier.
//!
//! [`PaletteClassifier`] is a centroid classifier over a coarse colour
//! feature: labelled reference colours are pooled into one unit-length
//! centroid per label, and an image takes the label of the nearest centroid
//! by cosine similarity.

use std::collections::BTreeMap;

use image::DynamicImage;

use crate::AnalysisError;

/// Classifier that runs in-process and returns a short descriptive label.
pub trait LocalClassifier: Send + Sync {
    fn classify(&self, image: &DynamicImage, prompt: &str) -> Result<String, AnalysisError>;
}

/// Reference colours for common artifact materials (sRGB).
const DEFAULT_PALETTE: &[(&str, [u8; 3])] = &[
    ("Bronze object", [140, 110, 60]),
    ("Bronze object", [90, 120, 90]), // verdigris
    ("Ceramic sherd", [175, 95, 60]),
    ("Ceramic sherd", [195, 130, 90]),
    ("Iron object", [95, 60, 45]),
    ("Flint tool", [95, 95, 100]),
    ("Flint tool", [125, 120, 115]),
    ("Bone fragment", [225, 215, 190]),
    ("Gold ornament", [212, 175, 55]),
    ("Jade carving", [60, 140, 90]),
    ("Obsidian blade", [30, 28, 32]),
];

/// Side of the thumbnail features are computed from.
const THUMBNAIL: u32 = 32;

pub struct PaletteClassifier {
    centroids: Vec<(String, Vec<f32>)>,
}

impl Default for PaletteClassifier {
    fn default() -> Self {
        Self::build(DEFAULT_PALETTE)
    }
}

impl PaletteClassifier {
    /// Build centroids from labelled reference colours.
    ///
    /// Samples sharing a label are mean-pooled, then L2-normalized.
    pub fn build(samples: &[(&str, [u8; 3])]) -> Self {
        let mut accum: BTreeMap<&str, (Vec<f32>, usize)> = BTreeMap::new();
        for &(label, rgb) in samples {
            let feat = rgb_features(rgb_unit(rgb));
            let entry = accum
                .entry(label)
                .or_insert_with(|| (vec![0.0f32; feat.len()], 0));
            for (acc, val) in entry.0.iter_mut().zip(&feat) {
                *acc += val;
            }
            entry.1 += 1;
        }

        let centroids = accum
            .into_iter()
            .map(|(label, (mut sum, count))| {
                for v in &mut sum {
                    *v /= count as f32;
                }
                normalize(&mut sum);
                (label.to_string(), sum)
            })
            .collect();

        Self { centroids }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|(l, _)| l.as_str())
    }

    /// Nearest label and its cosine similarity. `None` for an empty palette
    /// or an image with no pixels.
    pub fn classify_scored(&self, image: &DynamicImage) -> Option<(&str, f32)> {
        let mut feat = rgb_features(mean_rgb(image)?);
        normalize(&mut feat);

        let mut best: Option<(&str, f32)> = None;
        for (label, centroid) in &self.centroids {
            let sim = dot(&feat, centroid);
            if best.is_none_or(|(_, b)| sim > b) {
                best = Some((label.as_str(), sim));
            }
        }
        best
    }
}

impl LocalClassifier for PaletteClassifier {
    fn classify(&self, image: &DynamicImage, _prompt: &str) -> Result<String, AnalysisError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::Classifier(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        self.classify_scored(image)
            .map(|(label, _)| label.to_string())
            .ok_or_else(|| AnalysisError::Classifier("no reference labels configured".into()))
    }
}

/// Mean colour of a downscaled copy, channels in [0, 1].
fn mean_rgb(image: &DynamicImage) -> Option<[f32; 3]> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    let thumb = image.thumbnail(THUMBNAIL, THUMBNAIL).to_rgb8();
    let n = (thumb.width() * thumb.height()).max(1) as f32;
    let mut sum = [0.0f32; 3];
    for px in thumb.pixels() {
        for (s, &c) in sum.iter_mut().zip(&px.0) {
            *s += c as f32;
        }
    }
    Some(sum.map(|s| s / n / 255.0))
}

fn rgb_unit(rgb: [u8; 3]) -> [f32; 3] {
    rgb.map(|c| c as f32 / 255.0)
}

/// Chroma offsets around the grey level, plus brightness centred on mid-grey.
///
/// Pure mean-RGB would map all greys to one direction; the brightness term
/// separates dark stone from pale bone.
fn rgb_features([r, g, b]: [f32; 3]) -> Vec<f32> {
    let m = (r + g + b) / 3.0;
    vec![r - m, g - m, b - m, m - 0.5]
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
