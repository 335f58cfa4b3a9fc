//! Plain-text rendering for terminal output.

use std::fmt::Write;
use std::path::Path;

use digsite_ai::TierCatalogue;
use digsite_core::{AnalysisResult, RankedMatches};

/// Tier table: name, backend, expected latency, summary.
pub fn tier_table(catalogue: &TierCatalogue) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<10} {:<28} {:<15} NOTES", "TIER", "BACKEND", "EXPECTED");
    for (tier, backend) in catalogue.iter() {
        let _ = writeln!(
            out,
            "{:<10} {:<28} {:<15} {}",
            tier.as_str(),
            backend.method,
            backend.expected_latency,
            tier.summary()
        );
    }
    out
}

/// Card for one analysis result. The embedding is not shown.
pub fn result_card(path: &Path, result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", path.display());
    let _ = writeln!(out, "  name:        {}", result.name);
    let _ = writeln!(out, "  confidence:  {:.2}", result.confidence);
    let _ = writeln!(out, "  method:      {}", result.method);
    let _ = writeln!(out, "  tier:        {} ({})", result.tier, result.analysis_time);
    if !result.description.is_empty() {
        let _ = writeln!(out, "  description: {}", result.description);
    }
    out.push('\n');
    out
}

pub fn matches_table(matches: &RankedMatches) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:>8}  NAME", "ID", "SCORE");
    for m in std::iter::once(&matches.best).chain(&matches.alternatives) {
        let _ = writeln!(out, "{:<6} {:>8.4}  {}", m.entry.id, m.score, m.entry.name);
    }
    out
}
