//! Credit Risk Core
//!
//! Shared pieces of the credit-risk trainer and predictor.
//!
//! Modules:
//! - `schema`: Canonical feature order, defaults and the applicant record
//! - `config`: Paths, dataset layout and forest hyperparameters
//! - `forest`: Random-forest model, tree traversal and persistence
//! - `serde_canon`: Canonical JSON and BLAKE3 hashing for model artifacts
//! - `errors`: Configuration errors

pub mod config;
pub mod errors;
pub mod forest;
pub mod schema;
pub mod serde_canon;

pub use config::{CreditConfig, DataPaths, DatasetConfig, ForestParams, MaxFeatures, PathsConfig, SplitConfig};
pub use errors::ConfigError;
pub use forest::{ForestModel, ModelError, ModelMetadata, Node, Tree};
pub use schema::{
    CreditApplication, CATEGORICAL_COLUMNS, FEATURE_COLUMNS, FEATURE_COUNT, FEATURE_DEFAULTS,
    TARGET_COLUMN,
};

/// Crate version string recorded in model metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
