use credit_core::{ForestParams, MaxFeatures, FEATURE_COLUMNS};
use credit_predictor::{credit_score, CreditPrediction, Predictor, Risk};
use credit_trainer::{Dataset, ForestTrainer};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Small forest over the full schema, trained once for all cases
fn predictor() -> &'static Predictor {
    static PREDICTOR: OnceLock<Predictor> = OnceLock::new();
    PREDICTOR.get_or_init(|| {
        let features: Vec<Vec<f64>> = (0..120)
            .map(|i| {
                (0..FEATURE_COLUMNS.len())
                    .map(|f| ((i * (f + 3) + f) % 17) as f64)
                    .collect()
            })
            .collect();
        let targets = features.iter().map(|row| usize::from(row[1] + row[4] > 16.0)).collect();
        let dataset = Dataset {
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            features,
            targets,
            encoders: BTreeMap::new(),
        };
        let params = ForestParams {
            n_trees: 7,
            max_depth: 6,
            max_features: MaxFeatures::Sqrt,
            ..ForestParams::default()
        };
        let model = ForestTrainer::new(params)
            .train(&dataset)
            .expect("training synthetic forest");
        Predictor::from_model(model)
    })
}

fn feature_object() -> impl Strategy<Value = BTreeMap<String, f64>> {
    prop::collection::btree_map(
        prop::sample::select(FEATURE_COLUMNS.to_vec()).prop_map(str::to_string),
        -1_000.0f64..50_000.0,
        0..=FEATURE_COLUMNS.len(),
    )
}

proptest! {
    #[test]
    fn credit_score_is_bounded_and_monotone(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(credit_score(lo) <= 1000);
        prop_assert!(credit_score(hi) <= 1000);
        prop_assert!(credit_score(lo) >= credit_score(hi));
    }
}

proptest! {
    #[test]
    fn prediction_fields_are_consistent(p_default in 0.0f64..=1.0) {
        let class = usize::from(p_default > 0.5);
        let prediction = CreditPrediction::from_class_proba(class, &[1.0 - p_default, p_default])
            .expect("two probabilities");

        prop_assert!((prediction.probability_default + prediction.probability_good - 1.0).abs() < 1e-12);
        prop_assert_eq!(prediction.risk == Risk::High, class == 1);
        prop_assert_eq!(prediction.credit_score, credit_score(p_default));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_feature_object_scores_cleanly(features in feature_object()) {
        let json = serde_json::to_string(&features).expect("encode features");
        let prediction = predictor().predict_json(&json).expect("prediction");

        prop_assert!((prediction.probability_default + prediction.probability_good - 1.0).abs() < 1e-9);
        prop_assert!(prediction.credit_score <= 1000);
        prop_assert!((0.0..=1.0).contains(&prediction.probability_default));
        if prediction.risk == Risk::High {
            prop_assert!(prediction.probability_default > prediction.probability_good);
        }
    }
}
