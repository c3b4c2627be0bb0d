//! Random-forest model with persistence
//!
//! Implements the classifier artifact shared by trainer and predictor:
//! - Probability averaging over trees
//! - Canonical JSON serialization
//! - BLAKE3 content fingerprint recorded in metadata

use super::tree::Tree;
use crate::config::ForestParams;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json_pretty, CanonicalError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    CanonicalError(#[from] CanonicalError),

    #[error("Expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Provenance recorded alongside the trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    /// Version of the crate that trained the model
    pub trainer_version: String,
    /// Unix timestamp (seconds) of training
    pub created_at: i64,
    /// Hyperparameters used for fitting
    pub params: ForestParams,
    /// Rows in the training partition
    pub training_samples: usize,
    /// Accuracy on the held-out partition, if evaluated
    pub test_accuracy: Option<f64>,
    /// BLAKE3 hex of the canonical trees and feature layout; identical
    /// data, parameters and seed give an identical fingerprint
    pub model_hash: String,
}

/// Random-forest classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    /// Number of classes (2 for good/bad)
    pub n_classes: usize,

    /// Number of input features
    pub feature_count: usize,

    /// Training column order; empty when unknown
    pub feature_names: Vec<String>,

    /// Trees in the ensemble
    pub trees: Vec<Tree>,

    pub metadata: ModelMetadata,
}

/// Part of the model covered by the content hash
#[derive(Serialize)]
struct HashedContent<'a> {
    n_classes: usize,
    feature_count: usize,
    feature_names: &'a [String],
    trees: &'a [Tree],
}

impl ForestModel {
    /// Assemble a model and stamp its content hash
    pub fn new(
        n_classes: usize,
        feature_names: Vec<String>,
        trees: Vec<Tree>,
        params: ForestParams,
        training_samples: usize,
    ) -> Result<Self, ModelError> {
        let mut model = Self {
            n_classes,
            feature_count: feature_names.len(),
            feature_names,
            trees,
            metadata: ModelMetadata {
                trainer_version: crate::VERSION.to_string(),
                created_at: chrono::Utc::now().timestamp(),
                params,
                training_samples,
                test_accuracy: None,
                model_hash: String::new(),
            },
        };
        model.metadata.model_hash = model.content_hash()?;
        Ok(model)
    }

    /// Fingerprint of everything that affects predictions
    pub fn content_hash(&self) -> Result<String, ModelError> {
        Ok(hash_canonical_hex(&HashedContent {
            n_classes: self.n_classes,
            feature_count: self.feature_count,
            feature_names: &self.feature_names,
            trees: &self.trees,
        })?)
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_classes < 2 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid class count: {}",
                self.n_classes
            )));
        }

        if !self.feature_names.is_empty() && self.feature_names.len() != self.feature_count {
            return Err(ModelError::ValidationFailed(format!(
                "{} feature names for {} features",
                self.feature_names.len(),
                self.feature_count
            )));
        }

        if self.trees.is_empty() {
            return Err(ModelError::ValidationFailed("Model has no trees".to_string()));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_classes, self.feature_count).map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }

    /// Average class probabilities over all trees
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.feature_count {
            return Err(ModelError::ShapeMismatch {
                expected: self.feature_count,
                actual: features.len(),
            });
        }

        let mut sum = vec![0.0; self.n_classes];
        for (i, tree) in self.trees.iter().enumerate() {
            let dist = tree.evaluate(features).ok_or_else(|| {
                ModelError::ValidationFailed(format!("Tree {i} could not be evaluated"))
            })?;
            for (acc, p) in sum.iter_mut().zip(dist) {
                *acc += p;
            }
        }

        let n = self.trees.len().max(1) as f64;
        Ok(sum.into_iter().map(|s| s / n).collect())
    }

    /// Most probable class; ties go to the lower class index
    pub fn predict(&self, features: &[f64]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(features)?;
        Ok(argmax(&proba))
    }

    /// Predict both class and probabilities in one pass
    pub fn predict_with_proba(&self, features: &[f64]) -> Result<(usize, Vec<f64>), ModelError> {
        let proba = self.predict_proba(features)?;
        Ok((argmax(&proba), proba))
    }

    /// Save model to an indented canonical JSON file; returns the bytes written
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>, ModelError> {
        let json = to_canonical_json_pretty(self)?;
        fs::write(path, json.as_bytes())?;
        Ok(json.into_bytes())
    }

    /// Parse and validate a model from JSON bytes
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: ForestModel = serde_json::from_slice(bytes)?;
        model.validate()?;
        Ok(model)
    }

    /// Load model from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let bytes = fs::read(path)?;
        Self::from_json_bytes(&bytes)
    }

    /// Get number of trees in the model
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tree::Node;
    use tempfile::NamedTempFile;

    fn create_test_model() -> ForestModel {
        let tree1 = Tree::new(vec![
            Node::internal(0, 0, 50.0, 1, 2),
            Node::leaf(1, vec![1.0, 0.0]),
            Node::leaf(2, vec![0.0, 1.0]),
        ]);
        let tree2 = Tree::new(vec![
            Node::internal(0, 1, 30.0, 1, 2),
            Node::leaf(1, vec![0.5, 0.5]),
            Node::leaf(2, vec![0.0, 1.0]),
        ]);

        ForestModel::new(
            2,
            vec!["duration".to_string(), "age".to_string()],
            vec![tree1, tree2],
            ForestParams::default(),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_model_creation() {
        let model = create_test_model();
        assert_eq!(model.num_trees(), 2);
        assert_eq!(model.feature_count, 2);
        assert_eq!(model.metadata.model_hash.len(), 64);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_probability_averaging() {
        let model = create_test_model();

        // tree1 left (1.0, 0.0), tree2 left (0.5, 0.5)
        let proba = model.predict_proba(&[10.0, 20.0]).unwrap();
        assert_eq!(proba, vec![0.75, 0.25]);
        assert_eq!(model.predict(&[10.0, 20.0]).unwrap(), 0);

        // tree1 right (0.0, 1.0), tree2 right (0.0, 1.0)
        let (class, proba) = model.predict_with_proba(&[60.0, 40.0]).unwrap();
        assert_eq!(class, 1);
        assert_eq!(proba, vec![0.0, 1.0]);
    }

    #[test]
    fn test_tie_goes_to_class_zero() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.25, 0.75]), 1);
    }

    #[test]
    fn test_shape_mismatch() {
        let model = create_test_model();
        match model.predict_proba(&[1.0, 2.0, 3.0]) {
            Err(ModelError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_save_load_json() {
        let model = create_test_model();
        let temp_file = NamedTempFile::new().unwrap();

        let bytes = model.save_json(temp_file.path()).unwrap();
        assert_eq!(bytes, std::fs::read(temp_file.path()).unwrap());

        let loaded = ForestModel::load_json(temp_file.path()).unwrap();
        assert_eq!(model, loaded);
        assert_eq!(model.content_hash().unwrap(), loaded.content_hash().unwrap());
    }

    #[test]
    fn test_hash_tracks_trees() {
        let mut model = create_test_model();
        let before = model.content_hash().unwrap();
        model.trees[0].nodes[1] = Node::leaf(1, vec![0.0, 1.0]);
        assert_ne!(before, model.content_hash().unwrap());
    }

    #[test]
    fn test_hash_ignores_metadata() {
        let mut model = create_test_model();
        let before = model.content_hash().unwrap();
        model.metadata.test_accuracy = Some(0.8);
        model.metadata.created_at += 100;
        assert_eq!(before, model.content_hash().unwrap());
    }

    #[test]
    fn test_model_validation() {
        let mut invalid = create_test_model();
        invalid.trees.clear();
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.feature_names.pop();
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.trees[1].nodes[2] = Node::leaf(2, vec![1.0]);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            ForestModel::from_json_bytes(b"\x80\x02pickle"),
            Err(ModelError::JsonError(_))
        ));
    }
}
