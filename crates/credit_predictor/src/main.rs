//! Credit Risk Predictor CLI
//!
//! Scores one applicant and prints exactly one JSON line on stdout. Failures
//! are reported as `{"error": ...}` with exit status 0 so the calling process
//! always has a payload to read.

use clap::Parser;
use credit_core::CreditConfig;
use credit_predictor::{CreditPrediction, PredictError, PredictionResponse, Predictor};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "credit-predict")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Score one credit applicant given as a JSON object", long_about = None)]
struct Args {
    /// JSON object of feature name to number, e.g. '{"duration": 24, "age": 41}'
    features: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory holding the trained model
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    let response = PredictionResponse::from(run(&args));
    println!("{}", response.to_json_line());
}

fn run(args: &Args) -> Result<CreditPrediction, PredictError> {
    let config = match &args.config {
        Some(path) => CreditConfig::load_from_file(path)
            .map_err(|e| PredictError::Internal(e.to_string()))?,
        None => CreditConfig::default(),
    };
    let paths = config
        .resolve_paths(args.data_dir.as_deref())
        .map_err(|e| PredictError::Internal(e.to_string()))?;
    debug!("Data directory: {}", paths.data_dir.display());

    Predictor::load(&paths)?.predict_json(&args.features)
}

/// stdout is reserved for the JSON payload, so logs go to stderr
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    // Logging is best effort; a failure here must not suppress the payload
    let _ = tracing::subscriber::set_global_default(subscriber);
}
