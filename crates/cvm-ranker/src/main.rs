use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};

use cvm_common::export;
use cvm_common::logging;
use cvm_common::matching::{MatchEngine, MatchEngineConfig};
use cvm_common::{CandidateProfile, JobProfile};
use cvm_refiner::{HttpRefiner, RefinerConfig};

/// Rank extracted candidate profiles against one extracted job posting.
///
/// Inputs are the JSON files the extraction pipeline produces; output is the
/// ranked result list as JSON on stdout, optionally also as CSV.
#[derive(Debug, Parser)]
#[command(name = "cvm-ranker", about = "Rank candidate profiles against a job posting")]
struct Cli {
    /// Path to the job-analysis JSON
    #[arg(long)]
    job: PathBuf,

    /// Paths to candidate-profile JSON files
    #[arg(long, required = true, num_args = 1..)]
    candidates: Vec<PathBuf>,

    /// Keep only the K best-ranked candidates
    #[arg(long)]
    top_k: Option<usize>,

    /// Refine scores through the configured AI provider (REFINER_* env vars)
    #[arg(long, default_value_t = false)]
    refine: bool,

    /// Also write the flattened ranking as CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn load_job(path: &PathBuf) -> Result<JobProfile, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let job = serde_json::from_str(&raw)?;
    Ok(job)
}

fn load_candidates(paths: &[PathBuf]) -> Vec<CandidateProfile> {
    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = std::fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|err| err.to_string()));

        match parsed {
            Ok(candidate) => candidates.push(candidate),
            // one unreadable CV never aborts the batch
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable candidate file"),
        }
    }
    candidates
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_tracing_subscriber("cvm-ranker");
    logging::install_tracing_panic_hook("cvm-ranker");

    let args = Cli::parse();

    let job = load_job(&args.job)?;
    let candidates = load_candidates(&args.candidates);
    info!(
        job = %job.title,
        candidates = candidates.len(),
        refine = args.refine,
        "starting batch matching"
    );

    let mut engine = MatchEngine::new(MatchEngineConfig::default())?;
    if args.refine {
        let config = RefinerConfig::from_env();
        if config.api_key.is_empty() {
            warn!("no refiner API key configured; running heuristic-only");
        } else {
            engine = engine.with_refiner(Arc::new(HttpRefiner::new(config)?));
        }
    }

    let ranking = engine.match_batch(&job, &candidates, args.top_k).await?;

    if let Some(csv_path) = &args.csv {
        std::fs::write(csv_path, export::to_csv(&ranking))?;
        info!(path = %csv_path.display(), rows = ranking.len(), "wrote CSV export");
    }

    println!("{}", serde_json::to_string_pretty(&ranking)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("cvm-ranker failed: {err}");
        std::process::exit(1);
    }
}
