//! CSV dataset loading and preprocessing
//!
//! Reads a headed CSV, maps the label column to {0 = good, 1 = bad} and
//! label-encodes the configured categorical columns. Every other column must
//! be numeric.

use credit_core::DatasetConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::errors::DatasetError;

/// Number of target classes
pub const N_CLASSES: usize = 2;

/// Maps each distinct string value of one column to an integer code.
///
/// Codes follow the sorted order of the distinct values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the code table from a column
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    /// Code of a value seen during `fit`
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    /// Learned values in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Training dataset with encoded features and binary targets
#[derive(Clone, Debug)]
pub struct Dataset {
    /// Feature columns in file order (label column removed)
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<usize>,
    /// Encoders fitted for this run, keyed by column
    pub encoders: BTreeMap<String, LabelEncoder>,
}

impl Dataset {
    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, config: &DatasetConfig) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file, config)
    }

    /// Load dataset from any CSV source
    pub fn from_reader<R: Read>(reader: R, config: &DatasetConfig) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let target_idx = headers
            .iter()
            .position(|h| h == config.target_column)
            .ok_or_else(|| DatasetError::MissingColumn(config.target_column.clone()))?;

        let feature_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(i, h)| (i, h.to_string()))
            .collect();
        if feature_columns.is_empty() {
            return Err(DatasetError::NoFeatures);
        }

        // Raw values, column-major, so encoders can be fit per column
        let mut raw: Vec<Vec<String>> = vec![Vec::new(); feature_columns.len()];
        let mut targets = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            let row = row_idx + 1;

            let label = record.get(target_idx).unwrap_or_default();
            targets.push(map_label(label, config).ok_or_else(|| DatasetError::InvalidLabel {
                row,
                column: config.target_column.clone(),
                value: label.to_string(),
            })?);

            for (slot, (col_idx, _)) in raw.iter_mut().zip(&feature_columns) {
                slot.push(record.get(*col_idx).unwrap_or_default().to_string());
            }
        }

        if targets.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut encoders = BTreeMap::new();
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(feature_columns.len());

        for ((_, name), values) in feature_columns.iter().zip(&raw) {
            if config.categorical_columns.iter().any(|c| c == name) {
                let encoder = LabelEncoder::fit(values.iter().map(String::as_str));
                debug!("Encoded '{}' with {} levels: {:?}", name, encoder.classes().len(), encoder.classes());
                let encoded = values
                    .iter()
                    .map(|v| encoder.transform(v).unwrap_or_default() as f64)
                    .collect();
                columns.push(encoded);
                encoders.insert(name.clone(), encoder);
            } else {
                let parsed = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        v.parse::<f64>().map_err(|_| DatasetError::InvalidNumber {
                            row: i + 1,
                            column: name.clone(),
                            value: v.clone(),
                        })
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                columns.push(parsed);
            }
        }

        let features = (0..targets.len())
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect();

        Ok(Self {
            feature_names: feature_columns.into_iter().map(|(_, name)| name).collect(),
            features,
            targets,
            encoders,
        })
    }

    /// Rows selected by index, in the given order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            encoders: self.encoders.clone(),
        }
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Samples per class
    pub fn class_counts(&self) -> [usize; N_CLASSES] {
        let mut counts = [0; N_CLASSES];
        for &t in &self.targets {
            counts[t] += 1;
        }
        counts
    }

    /// (min, max) per feature
    pub fn feature_stats(&self) -> Vec<(f64, f64)> {
        let mut stats = vec![(f64::INFINITY, f64::NEG_INFINITY); self.feature_count()];

        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        stats
    }
}

/// Raw label to class index
fn map_label(value: &str, config: &DatasetConfig) -> Option<usize> {
    let matches = |expected: &str| {
        value == expected
            || matches!(
                (value.parse::<f64>(), expected.parse::<f64>()),
                (Ok(a), Ok(b)) if a == b
            )
    };

    if matches(&config.good_label) {
        Some(0)
    } else if matches(&config.bad_label) {
        Some(1)
    } else {
        None
    }
}
