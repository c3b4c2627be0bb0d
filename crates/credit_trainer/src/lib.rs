//! Credit Risk Trainer - Deterministic offline random-forest trainer
//!
//! Loads the credit dataset, encodes categorical columns, fits a random
//! forest on a stratified split and writes the model artifacts the predictor
//! reads.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod metrics;
pub mod split;

use credit_core::{CreditConfig, DataPaths, ForestModel};
use std::path::Path;
use tracing::{debug, info, warn};

pub use dataset::{Dataset, LabelEncoder, N_CLASSES};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::{DatasetError, TrainerError};
pub use forest::ForestTrainer;
pub use metrics::{accuracy, ClassificationReport, ConfusionMatrix};
pub use split::{train_test_split, TrainTestSplit};

/// Result of one training run
#[derive(Debug)]
pub struct TrainingRun {
    pub model: ForestModel,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Load, split, fit and evaluate
pub fn train_from_csv(path: &Path, config: &CreditConfig) -> Result<TrainingRun, TrainerError> {
    info!("Loading dataset from: {}", path.display());
    let dataset = Dataset::from_csv(path, &config.dataset)?;
    let [good, bad] = dataset.class_counts();
    info!(
        "Loaded {} samples with {} features ({} good, {} bad)",
        dataset.len(),
        dataset.feature_count(),
        good,
        bad
    );

    for (name, (min, max)) in dataset.feature_names.iter().zip(dataset.feature_stats()) {
        debug!("  {name}: min={min}, max={max}");
    }
    if !dataset.encoders.is_empty() {
        warn!(
            "{} label encoders are not persisted; predictions expect pre-encoded integer codes",
            dataset.encoders.len()
        );
    }

    train_on_dataset(&dataset, config)
}

/// Split, fit and evaluate an already loaded dataset
pub fn train_on_dataset(dataset: &Dataset, config: &CreditConfig) -> Result<TrainingRun, TrainerError> {
    let split = train_test_split(dataset, &config.split)?;
    info!(
        "Split {} train / {} test (seed {}, stratified: {})",
        split.train.len(),
        split.test.len(),
        config.split.seed,
        config.split.stratify
    );

    let train = dataset.subset(&split.train);
    let test = dataset.subset(&split.test);

    let mut model = ForestTrainer::new(config.forest.clone()).train(&train)?;

    let predicted = test
        .features
        .iter()
        .map(|row| model.predict(row))
        .collect::<Result<Vec<_>, _>>()?;
    let report = ClassificationReport::new(&test.targets, &predicted);
    model.metadata.test_accuracy = Some(report.accuracy);

    Ok(TrainingRun {
        model,
        report,
        train_size: train.len(),
        test_size: test.len(),
    })
}

/// Write the model file and the feature-name list
pub fn write_artifacts(model: &ForestModel, paths: &DataPaths) -> Result<(), TrainerError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| TrainerError::Io { path, source }
    };

    std::fs::create_dir_all(&paths.data_dir).map_err(io_err(&paths.data_dir))?;

    info!("Saving model to: {}", paths.model.display());
    model.save_json(&paths.model)?;

    info!("Saving feature names to: {}", paths.feature_names.display());
    std::fs::write(&paths.feature_names, model.feature_names.join("\n"))
        .map_err(io_err(&paths.feature_names))?;

    Ok(())
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
