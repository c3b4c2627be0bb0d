//! Credit Risk Trainer CLI
//!
//! Trains the random forest used by `credit-predict` and writes the model
//! and the feature-name list into the data directory.

use anyhow::{Context, Result};
use clap::Parser;
use credit_core::CreditConfig;
use credit_trainer::{train_from_csv, write_artifacts, DatasetError, TrainerError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "credit-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the credit risk random forest", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (defaults to ../../data next to the executable)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Input CSV dataset (defaults to <data-dir>/german_credit.csv)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of trees
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Random seed for splitting and fitting
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    jobs: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => CreditConfig::load_from_file(path)?,
        None => CreditConfig::default(),
    };
    if let Some(trees) = args.trees {
        config.forest.n_trees = trees;
    }
    if let Some(depth) = args.max_depth {
        config.forest.max_depth = depth;
    }
    if let Some(seed) = args.seed {
        config.forest.seed = seed;
        config.split.seed = seed;
    }
    if let Some(jobs) = args.jobs {
        config.forest.n_jobs = jobs;
    }
    config.validate()?;

    let paths = config
        .resolve_paths(args.data_dir.as_deref())
        .context("Failed to resolve data directory")?;
    let input = args.input.unwrap_or_else(|| paths.dataset.clone());

    info!("Credit Risk Trainer v{}", env!("CARGO_PKG_VERSION"));

    let run = match train_from_csv(&input, &config) {
        Ok(run) => run,
        Err(TrainerError::Dataset(DatasetError::NotFound(path))) => {
            println!("Error: Dataset not found at {}", path.display());
            println!("Please place the German Credit dataset there first");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err).context("Training failed"),
    };

    println!("\nModel Accuracy: {:.4}", run.report.accuracy);
    println!("\nClassification Report:");
    println!("{}", run.report);
    println!("Confusion Matrix:");
    println!("{}", run.report.confusion);

    write_artifacts(&run.model, &paths).context("Failed to write model artifacts")?;
    info!("Model fingerprint: {}", run.model.metadata.model_hash);

    println!("Model saved to: {}", paths.model.display());
    println!("Training completed successfully!");

    Ok(ExitCode::SUCCESS)
}

/// Log to stderr so the report on stdout stays clean
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}
