use credit_core::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading and encoding the training CSV.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: unexpected label '{value}' in column '{column}'")]
    InvalidLabel {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: column '{column}' is not numeric: '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("dataset has no feature columns")]
    NoFeatures,

    #[error("dataset is empty")]
    Empty,
}

/// Errors returned by the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("training error: {0}")]
    Training(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
