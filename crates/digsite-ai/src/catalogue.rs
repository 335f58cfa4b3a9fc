//! Static tier → backend table.

use std::time::Duration;

use digsite_core::{BackendConfig, QualityTier, TierError, config::DEFAULT_TIMEOUT};

/// Provenance label for results produced by the local classifier.
pub const LOCAL_METHOD: &str = "ViT Classification";

/// Model identifiers for the remote tiers, fastest first.
pub const FAST_MODEL: &str = "llava:7b";
pub const BALANCED_MODEL: &str = "qwen2-vl:7b";
pub const QUALITY_MODEL: &str = "qwen3-vl:latest";

/// Read-only registry resolving each tier to its backend.
///
/// Every tier has exactly one entry; the table is built once and never mutated.
#[derive(Debug, Clone)]
pub struct TierCatalogue {
    backends: [BackendConfig; 4],
}

impl Default for TierCatalogue {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl TierCatalogue {
    /// Build the table with `remote_timeout` applied to every remote tier.
    pub fn new(remote_timeout: Duration) -> Self {
        Self {
            backends: [
                BackendConfig::local(LOCAL_METHOD, QualityTier::Instant.expected_latency()),
                BackendConfig::remote(
                    FAST_MODEL,
                    QualityTier::Fast.expected_latency(),
                    remote_timeout,
                ),
                BackendConfig::remote(
                    BALANCED_MODEL,
                    QualityTier::Balanced.expected_latency(),
                    remote_timeout,
                ),
                BackendConfig::remote(
                    QUALITY_MODEL,
                    QualityTier::Quality.expected_latency(),
                    remote_timeout,
                ),
            ],
        }
    }

    pub fn resolve(&self, tier: QualityTier) -> &BackendConfig {
        &self.backends[index(tier)]
    }

    /// Resolve a tier given by name. Unknown names fail before anything else happens.
    pub fn resolve_name(&self, name: &str) -> Result<(QualityTier, &BackendConfig), TierError> {
        let tier: QualityTier = name.parse()?;
        Ok((tier, self.resolve(tier)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (QualityTier, &BackendConfig)> {
        QualityTier::ALL.into_iter().map(|t| (t, self.resolve(t)))
    }
}

fn index(tier: QualityTier) -> usize {
    match tier {
        QualityTier::Instant => 0,
        QualityTier::Fast => 1,
        QualityTier::Balanced => 2,
        QualityTier::Quality => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digsite_core::BackendKind;

    #[test]
    fn documented_table() {
        let cat = TierCatalogue::default();

        let instant = cat.resolve(QualityTier::Instant);
        assert_eq!(instant.kind, BackendKind::LocalClassifier);
        assert!(instant.model.is_none());
        assert_eq!(instant.method, "ViT Classification");

        let expected = [
            (QualityTier::Fast, "llava:7b", "20-40 seconds"),
            (QualityTier::Balanced, "qwen2-vl:7b", "30-60 seconds"),
            (QualityTier::Quality, "qwen3-vl:latest", "1-2 minutes"),
        ];
        for (tier, model, latency) in expected {
            let backend = cat.resolve(tier);
            assert_eq!(backend.kind, BackendKind::RemoteGenerative, "{tier}");
            assert_eq!(backend.model.as_deref(), Some(model));
            assert_eq!(backend.expected_latency, latency);
            assert_eq!(backend.method, format!("Ollama ({model})"));
            assert!(backend.timeout >= Duration::from_secs(120));
        }
    }

    #[test]
    fn remote_models_are_distinct() {
        let cat = TierCatalogue::default();
        let models: Vec<_> = cat.iter().filter_map(|(_, b)| b.model.clone()).collect();
        assert_eq!(models.len(), 3);
        assert_ne!(models[0], models[1]);
        assert_ne!(models[1], models[2]);
        assert_ne!(models[0], models[2]);
    }

    #[test]
    fn timeout_override_applies_to_remote_tiers() {
        let cat = TierCatalogue::new(Duration::from_secs(300));
        for (tier, backend) in cat.iter() {
            if backend.is_remote() {
                assert_eq!(backend.timeout, Duration::from_secs(300), "{tier}");
            }
        }
    }

    #[test]
    fn resolve_name_rejects_unknown() {
        let cat = TierCatalogue::default();
        let (tier, backend) = cat.resolve_name("balanced").unwrap();
        assert_eq!(tier, QualityTier::Balanced);
        assert_eq!(backend.model.as_deref(), Some("qwen2-vl:7b"));

        let err = cat.resolve_name("bogus").unwrap_err();
        assert!(err.to_string().contains("INSTANT, FAST, BALANCED, QUALITY"));
    }
}
