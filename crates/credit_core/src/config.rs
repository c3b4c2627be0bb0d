//! Shared configuration for the trainer and predictor
//!
//! Every field defaults to the values the tools were built around, so an
//! empty TOML file (or no file at all) reproduces the stock behaviour.

use crate::errors::{ConfigError, Result};
use crate::schema::{CATEGORICAL_COLUMNS, TARGET_COLUMN};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CREDIT_DATA_DIR";

/// Data directory relative to the executable (`target/<profile>/` -> repo root)
const EXE_RELATIVE_DATA_DIR: &str = "../../data";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CreditConfig {
    /// File locations
    pub paths: PathsConfig,
    /// Dataset layout
    pub dataset: DatasetConfig,
    /// Train/test split
    pub split: SplitConfig,
    /// Forest hyperparameters
    pub forest: ForestParams,
}

/// File locations, relative to the data directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Data directory; resolved next to the executable when unset
    pub data_dir: Option<PathBuf>,
    pub dataset_file: String,
    pub model_file: String,
    pub feature_names_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            dataset_file: "german_credit.csv".to_string(),
            model_file: "credit_model.json".to_string(),
            feature_names_file: "feature_names.txt".to_string(),
        }
    }
}

/// Dataset layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// Label column
    pub target_column: String,
    /// Raw label value meaning good credit (class 0)
    pub good_label: String,
    /// Raw label value meaning bad credit (class 1)
    pub bad_label: String,
    /// Columns to label-encode when present
    pub categorical_columns: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            target_column: TARGET_COLUMN.to_string(),
            good_label: "1".to_string(),
            bad_label: "2".to_string(),
            categorical_columns: CATEGORICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Train/test split settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
    pub seed: u64,
    /// Preserve class proportions in both partitions
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            stratify: true,
        }
    }
}

/// Number of candidate features examined per split
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    /// Resolve against the total feature count (always at least 1)
    pub fn resolve(self, feature_count: usize) -> usize {
        let n = feature_count as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => feature_count,
        };
        k.clamp(1, feature_count.max(1))
    }
}

/// Random-forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Every leaf keeps at least this many samples
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
    pub seed: u64,
    /// Worker threads for tree building (0 = all cores)
    pub n_jobs: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
            n_jobs: 0,
        }
    }
}

/// Absolute artifact locations after data-directory resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub feature_names: PathBuf,
}

impl CreditConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CreditConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the trainer cannot work with
    pub fn validate(&self) -> Result<()> {
        let split = &self.split;
        if !(split.test_fraction > 0.0 && split.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "split.test_fraction must be in (0, 1), got {}",
                split.test_fraction
            )));
        }

        let forest = &self.forest;
        if forest.n_trees == 0 {
            return Err(ConfigError::Invalid("forest.n_trees must be positive".into()));
        }
        if forest.max_depth == 0 {
            return Err(ConfigError::Invalid("forest.max_depth must be positive".into()));
        }
        if forest.min_samples_split < 2 {
            return Err(ConfigError::Invalid(format!(
                "forest.min_samples_split must be at least 2, got {}",
                forest.min_samples_split
            )));
        }
        if forest.min_samples_leaf == 0 {
            return Err(ConfigError::Invalid("forest.min_samples_leaf must be positive".into()));
        }

        if self.dataset.good_label == self.dataset.bad_label {
            return Err(ConfigError::Invalid(
                "dataset.good_label and dataset.bad_label must differ".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the data directory.
    ///
    /// Order: explicit override, `CREDIT_DATA_DIR`, config file, then
    /// `../../data` next to the running executable.
    pub fn resolve_data_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        self.resolve_data_dir_with(cli_override, std::env::var_os(DATA_DIR_ENV))
    }

    fn resolve_data_dir_with(
        &self,
        cli_override: Option<&Path>,
        env_value: Option<OsString>,
    ) -> Result<PathBuf> {
        if let Some(dir) = cli_override {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = env_value.filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.paths.data_dir {
            return Ok(dir.clone());
        }

        let exe = std::env::current_exe()
            .map_err(|e| ConfigError::DataDir(format!("current executable unknown: {e}")))?;
        let exe_dir = exe
            .parent()
            .ok_or_else(|| ConfigError::DataDir(format!("{} has no parent", exe.display())))?;
        let dir = exe_dir.join(EXE_RELATIVE_DATA_DIR);
        debug!("Data directory resolved next to executable: {}", dir.display());
        Ok(dir)
    }

    /// Join the configured file names onto a data directory
    pub fn data_paths(&self, data_dir: &Path) -> DataPaths {
        let paths = &self.paths;
        DataPaths {
            data_dir: data_dir.to_path_buf(),
            dataset: data_dir.join(&paths.dataset_file),
            model: data_dir.join(&paths.model_file),
            feature_names: data_dir.join(&paths.feature_names_file),
        }
    }

    /// Resolve the data directory and build all artifact paths
    pub fn resolve_paths(&self, cli_override: Option<&Path>) -> Result<DataPaths> {
        let data_dir = self.resolve_data_dir(cli_override)?;
        Ok(self.data_paths(&data_dir))
    }
}
