mod display;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use digsite_ai::{Analyzer, rank};
use digsite_core::{Candidate, EndpointSources, FeatureVector, InferenceConfig, QualityTier};
use image::DynamicImage;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "digsite",
    version,
    about = "Tiered AI identification of archaeological artifact photos"
)]
struct Cli {
    /// Inference server base URL; overrides container detection and OLLAMA_ENDPOINT.
    #[arg(long, global = true, env = "DIGSITE_ENDPOINT")]
    endpoint: Option<String>,

    /// Upper bound for one call to a remote model.
    #[arg(long, global = true, env = "DIGSITE_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,

    /// Attempts per generation, including the first.
    #[arg(long, global = true, env = "DIGSITE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Identify one or more artifact photos.
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = TierArg::Fast)]
        tier: TierArg,
        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List quality tiers and their backends.
    Tiers,
    /// Recommend a tier for a maximum acceptable wait.
    Recommend { max_wait_secs: u64 },
    /// Check which tiers the inference server can currently serve.
    Health {
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
    },
    /// Rank catalogue entries by similarity to a query.
    Rank {
        /// JSON array of `{id, name, embedding}` entries.
        #[arg(long)]
        catalogue: PathBuf,
        /// Query image; embedded with the configured embedder.
        #[arg(long, required_unless_present = "vector", conflicts_with = "vector")]
        image: Option<PathBuf>,
        /// Query vector as a JSON array of numbers.
        #[arg(long)]
        vector: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Instant,
    Fast,
    Balanced,
    Quality,
}

impl From<TierArg> for QualityTier {
    fn from(t: TierArg) -> Self {
        match t {
            TierArg::Instant => QualityTier::Instant,
            TierArg::Fast => QualityTier::Fast,
            TierArg::Balanced => QualityTier::Balanced,
            TierArg::Quality => QualityTier::Quality,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    tracing::debug!("digsite v{}", env!("CARGO_PKG_VERSION"));

    let config = inference_config(&cli);
    let analyzer = Analyzer::from_config(&config);

    match cli.command {
        Command::Analyze { images, tier, json } => {
            run_analyze(&analyzer, &images, tier.into(), json).await
        }
        Command::Tiers => {
            print!("{}", display::tier_table(analyzer.catalogue()));
            Ok(())
        }
        Command::Recommend { max_wait_secs } => {
            let tier = QualityTier::recommend(max_wait_secs);
            println!("{tier} ({})", tier.expected_latency());
            Ok(())
        }
        Command::Health { tier } => {
            let tiers = match tier {
                Some(t) => vec![t.into()],
                None => QualityTier::ALL.to_vec(),
            };
            let checks = futures::future::join_all(
                tiers.iter().map(|&t| analyzer.is_backend_ready(t)),
            )
            .await;
            for (tier, ready) in tiers.iter().zip(checks) {
                println!("{:<10} {}", tier.as_str(), if ready { "ready" } else { "unavailable" });
            }
            Ok(())
        }
        Command::Rank {
            catalogue,
            image,
            vector,
            json,
        } => run_rank(&analyzer, &catalogue, image.as_deref(), vector.as_deref(), json),
    }
}

/// Process-wide logging, configured once. Logs go to stderr.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// The only place the process environment is read.
fn inference_config(cli: &Cli) -> InferenceConfig {
    let sources = EndpointSources {
        explicit: cli.endpoint.clone(),
        hostname: std::env::var("HOSTNAME").ok(),
        env_endpoint: std::env::var("OLLAMA_ENDPOINT").ok(),
    };
    InferenceConfig::from_sources(&sources)
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_max_retries(cli.max_retries)
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    image::open(path).with_context(|| format!("reading image {}", path.display()))
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    path: &'a Path,
    #[serde(flatten)]
    outcome: BatchOutcome,
}

#[derive(Serialize)]
#[serde(untagged)]
enum BatchOutcome {
    Ok(digsite_core::AnalysisResult),
    Err { error: String },
}

async fn run_analyze(
    analyzer: &Analyzer,
    paths: &[PathBuf],
    tier: QualityTier,
    json: bool,
) -> anyhow::Result<()> {
    let images = paths
        .iter()
        .map(|p| load_image(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let results = analyzer.analyze_batch(&images, tier).await;
    let failed = results.iter().filter(|r| r.is_err()).count();

    if json {
        let entries: Vec<BatchEntry> = paths
            .iter()
            .zip(results)
            .map(|(path, r)| BatchEntry {
                path,
                outcome: match r {
                    Ok(result) => BatchOutcome::Ok(result),
                    Err(e) => BatchOutcome::Err {
                        error: e.to_string(),
                    },
                },
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (path, r) in paths.iter().zip(&results) {
            match r {
                Ok(result) => print!("{}", display::result_card(path, result)),
                Err(e) => println!("{}: analysis failed: {e}\n", path.display()),
            }
        }
    }

    anyhow::ensure!(failed == 0, "{failed} of {} analyses failed", paths.len());
    Ok(())
}

fn run_rank(
    analyzer: &Analyzer,
    catalogue: &Path,
    image: Option<&Path>,
    vector: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(catalogue)
        .with_context(|| format!("reading catalogue {}", catalogue.display()))?;
    let candidates: Vec<Candidate> =
        serde_json::from_str(&raw).context("parsing catalogue entries")?;

    let query = match (image, vector) {
        (Some(path), _) => analyzer.embedder().embed(&load_image(path)?),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading query vector {}", path.display()))?;
            FeatureVector(serde_json::from_str(&raw).context("parsing query vector")?)
        }
        (None, None) => anyhow::bail!("either --image or --vector is required"),
    };

    let ranked = rank(&query, &candidates);
    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        match &ranked {
            Some(matches) => print!("{}", display::matches_table(matches)),
            None => println!("No comparable catalogue entries."),
        }
    }
    Ok(())
}
