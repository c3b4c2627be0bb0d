//! Prediction error types

use credit_core::ModelError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Message reported when no trained model is on disk
pub const MODEL_NOT_FOUND_MESSAGE: &str = "Model not found. Please train the model first.";

/// Errors raised while producing a prediction
#[derive(Error, Debug)]
pub enum PredictError {
    /// No model file at the expected location
    #[error("{}", MODEL_NOT_FOUND_MESSAGE)]
    ModelNotFound(PathBuf),

    /// Input is not a JSON object of numeric features
    #[error("{0}")]
    Parse(String),

    /// Input vector does not fit the model's feature layout
    #[error("{0}")]
    ShapeMismatch(String),

    /// Anything else: unreadable or corrupt model, hash mismatch
    #[error("{0}")]
    Internal(String),
}

/// Stable discriminant of [`PredictError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictErrorKind {
    ModelNotFound,
    Parse,
    ShapeMismatch,
    Internal,
}

impl PredictErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictErrorKind::ModelNotFound => "model_not_found",
            PredictErrorKind::Parse => "parse",
            PredictErrorKind::ShapeMismatch => "shape_mismatch",
            PredictErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for PredictErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PredictError {
    pub fn kind(&self) -> PredictErrorKind {
        match self {
            PredictError::ModelNotFound(_) => PredictErrorKind::ModelNotFound,
            PredictError::Parse(_) => PredictErrorKind::Parse,
            PredictError::ShapeMismatch(_) => PredictErrorKind::ShapeMismatch,
            PredictError::Internal(_) => PredictErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for PredictError {
    fn from(err: serde_json::Error) -> Self {
        PredictError::Parse(err.to_string())
    }
}

impl From<ModelError> for PredictError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ShapeMismatch { .. } => PredictError::ShapeMismatch(err.to_string()),
            other => PredictError::Internal(other.to_string()),
        }
    }
}
