//! Credit Risk Predictor
//!
//! Loads the trained forest and scores one applicant given as a JSON object of
//! feature name to number. Absent features take the schema defaults.
//!
//! The output is a single JSON object:
//!
//! ```json
//! {"risk": "low", "probability_default": 0.23, "probability_good": 0.77, "credit_score": 770}
//! ```
//!
//! or `{"error": "..."}` when anything fails.

pub mod errors;

use credit_core::{CreditApplication, DataPaths, ForestModel, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::fs;
use serde_json::ser::{Formatter, Serializer};
use std::io;
use tracing::debug;

pub use errors::{PredictError, PredictErrorKind, MODEL_NOT_FOUND_MESSAGE};

/// Risk band derived from the predicted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    /// Predicted class 1 (bad credit)
    High,
    /// Predicted class 0 (good credit)
    Low,
}

/// Scored applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditPrediction {
    pub risk: Risk,
    pub probability_default: f64,
    pub probability_good: f64,
    pub credit_score: u32,
}

impl CreditPrediction {
    /// Build from the forest's class and class probabilities
    pub fn from_class_proba(class: usize, proba: &[f64]) -> Result<Self, PredictError> {
        let [probability_good, probability_default] = proba else {
            return Err(PredictError::ShapeMismatch(format!(
                "Expected 2 class probabilities, got {}",
                proba.len()
            )));
        };

        Ok(Self {
            risk: if class == 1 { Risk::High } else { Risk::Low },
            probability_default: *probability_default,
            probability_good: *probability_good,
            credit_score: credit_score(*probability_default),
        })
    }
}

/// `(1 - p_default) * 1000`, truncated to an integer in `0..=1000`
pub fn credit_score(probability_default: f64) -> u32 {
    ((1.0 - probability_default) * 1000.0).clamp(0.0, 1000.0) as u32
}

/// Wire form written to stdout: either a prediction or `{"error": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Prediction(CreditPrediction),
    Error { error: String },
}

impl PredictionResponse {
    /// Serialize as one JSON line (no trailing newline) with `", "` and
    /// `": "` separators
    pub fn to_json_line(&self) -> String {
        let mut out = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut out, SpacedFormatter);
        match self.serialize(&mut serializer) {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(e) => format!("{{\"error\": \"failed to encode response: {e}\"}}"),
        }
    }
}

/// Single-line JSON with a space after every separator
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

impl From<Result<CreditPrediction, PredictError>> for PredictionResponse {
    fn from(result: Result<CreditPrediction, PredictError>) -> Self {
        match result {
            Ok(prediction) => PredictionResponse::Prediction(prediction),
            Err(err) => PredictionResponse::Error {
                error: err.to_string(),
            },
        }
    }
}

/// A loaded, validated model ready to score applicants
#[derive(Debug, Clone)]
pub struct Predictor {
    model: ForestModel,
}

impl Predictor {
    /// Load the model from the data directory.
    ///
    /// Fails with [`PredictError::ModelNotFound`] before touching the file
    /// when it does not exist.
    pub fn load(paths: &DataPaths) -> Result<Self, PredictError> {
        if !paths.model.exists() {
            return Err(PredictError::ModelNotFound(paths.model.clone()));
        }

        debug!("Loading model from: {}", paths.model.display());
        let bytes = fs::read(&paths.model).map_err(|e| {
            PredictError::Internal(format!("failed to read {}: {e}", paths.model.display()))
        })?;

        Ok(Self::from_model(ForestModel::from_json_bytes(&bytes)?))
    }

    pub fn from_model(model: ForestModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ForestModel {
        &self.model
    }

    /// Parse a JSON feature object and score it
    pub fn predict_json(&self, features_json: &str) -> Result<CreditPrediction, PredictError> {
        let application = CreditApplication::from_json(features_json)?;
        self.predict(&application)
    }

    /// Score one applicant
    pub fn predict(&self, application: &CreditApplication) -> Result<CreditPrediction, PredictError> {
        let vector = self.feature_vector(application)?;
        let (class, proba) = self.model.predict_with_proba(&vector)?;
        debug!("class={class} proba={proba:?}");
        CreditPrediction::from_class_proba(class, &proba)
    }

    /// Lay the applicant out in the model's training column order
    fn feature_vector(&self, application: &CreditApplication) -> Result<Vec<f64>, PredictError> {
        if self.model.feature_names.is_empty() {
            if self.model.feature_count != FEATURE_COUNT {
                return Err(PredictError::ShapeMismatch(format!(
                    "Expected {} features, got {}",
                    self.model.feature_count, FEATURE_COUNT
                )));
            }
            return Ok(application.to_vector().to_vec());
        }

        application
            .to_vector_in(&self.model.feature_names)
            .map_err(|name| {
                PredictError::ShapeMismatch(format!(
                    "Model expects feature '{name}' which is not an applicant field"
                ))
            })
    }
}

/// Load the model and score one JSON feature object
pub fn predict(features_json: &str, paths: &DataPaths) -> Result<CreditPrediction, PredictError> {
    Predictor::load(paths)?.predict_json(features_json)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use credit_core::{ForestParams, Node, Tree, FEATURE_COLUMNS};

    /// One stump per model: duration > 24 is bad
    fn stump_model(feature_names: Vec<String>) -> ForestModel {
        let duration = feature_names
            .iter()
            .position(|n| n == "duration")
            .unwrap_or(1) as i32;
        let tree = Tree::new(vec![
            Node::internal(0, duration, 24.0, 1, 2),
            Node::leaf(1, vec![0.8, 0.2]),
            Node::leaf(2, vec![0.3, 0.7]),
        ]);
        let mut model = ForestModel::new(2, feature_names, vec![tree], ForestParams::default(), 10).unwrap();
        model.feature_count = FEATURE_COUNT;
        model
    }

    fn canonical_names() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_credit_score() {
        assert_eq!(credit_score(0.0), 1000);
        assert_eq!(credit_score(1.0), 0);
        assert_eq!(credit_score(0.25), 750);
        // Truncated, not rounded
        assert_eq!(credit_score(0.2345), 765);
        assert_eq!(credit_score(1.5), 0);
        assert_eq!(credit_score(-0.5), 1000);
    }

    #[test]
    fn test_predict_defaults() {
        let predictor = Predictor::from_model(stump_model(canonical_names()));
        let prediction = predictor.predict_json("{}").unwrap();

        assert_eq!(prediction.risk, Risk::Low);
        assert_eq!(prediction.probability_good, 0.8);
        assert!((prediction.probability_default - 0.2).abs() < 1e-12);
        assert_eq!(prediction.credit_score, 800);
    }

    #[test]
    fn test_predict_high_risk() {
        let predictor = Predictor::from_model(stump_model(canonical_names()));
        let prediction = predictor.predict_json(r#"{"duration": 48, "foo": "ignored"}"#).unwrap();

        assert_eq!(prediction.risk, Risk::High);
        assert_eq!(prediction.probability_default, 0.7);
        assert_eq!(prediction.credit_score, 300);
    }

    #[test]
    fn test_feature_order_follows_model() {
        let mut names = canonical_names();
        names.reverse();
        let predictor = Predictor::from_model(stump_model(names));

        let prediction = predictor.predict_json(r#"{"duration": 36}"#).unwrap();
        assert_eq!(prediction.risk, Risk::High);
    }

    #[test]
    fn test_unknown_model_feature_is_shape_mismatch() {
        let mut names = canonical_names();
        names[5] = "income".to_string();
        let predictor = Predictor::from_model(stump_model(names));

        let err = predictor.predict_json("{}").unwrap_err();
        assert_eq!(err.kind(), PredictErrorKind::ShapeMismatch);
        assert!(err.to_string().contains("income"));
    }

    #[test]
    fn test_unnamed_model_needs_twenty_features() {
        let mut model = stump_model(Vec::new());
        model.feature_count = 3;
        let err = Predictor::from_model(model).predict_json("{}").unwrap_err();
        assert_eq!(err.kind(), PredictErrorKind::ShapeMismatch);

        let model = stump_model(Vec::new());
        assert!(Predictor::from_model(model).predict_json("{}").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        let predictor = Predictor::from_model(stump_model(canonical_names()));
        for input in ["not-json", "[1, 2]", "42", r#"{"age": "old"}"#, r#"{"age": null}"#] {
            let err = predictor.predict_json(input).unwrap_err();
            assert_eq!(err.kind(), PredictErrorKind::Parse, "input: {input}");
        }
    }

    #[test]
    fn test_response_json() {
        let result: Result<CreditPrediction, PredictError> = Ok(CreditPrediction {
            risk: Risk::Low,
            probability_default: 0.25,
            probability_good: 0.75,
            credit_score: 750,
        });
        let ok = PredictionResponse::from(result);
        assert_eq!(
            ok.to_json_line(),
            r#"{"risk": "low", "probability_default": 0.25, "probability_good": 0.75, "credit_score": 750}"#
        );

        let result: Result<CreditPrediction, PredictError> =
            Err(PredictError::ModelNotFound("credit_model.json".into()));
        let err = PredictionResponse::from(result);
        assert_eq!(
            err.to_json_line(),
            r#"{"error": "Model not found. Please train the model first."}"#
        );
    }

    #[test]
    fn test_probability_shape_checked() {
        let err = CreditPrediction::from_class_proba(0, &[0.2, 0.3, 0.5]).unwrap_err();
        assert_eq!(err.kind(), PredictErrorKind::ShapeMismatch);
    }
}
