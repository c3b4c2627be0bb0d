//! Applicant feature schema
//!
//! The feature order, default values and the named record are generated from
//! one table, so the vector handed to the model cannot drift from the names
//! the trainer writes out.
//!
//! Categorical fields carry the integer codes produced by label encoding at
//! training time. Encoders are not persisted; callers supply codes directly.
//!
//! Values may arrive as JSON numbers, numeric strings (`"35"`) or booleans
//! (`true` is 1). Anything else in a present key is rejected.

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use serde_json::Value;

/// Name of the label column in the training CSV
pub const TARGET_COLUMN: &str = "credit_risk";

/// Columns label-encoded by the trainer when present in the dataset
pub const CATEGORICAL_COLUMNS: [&str; 13] = [
    "checking_account",
    "credit_history",
    "purpose",
    "savings_account",
    "employment",
    "personal_status",
    "other_debtors",
    "property",
    "other_installment_plans",
    "housing",
    "job",
    "telephone",
    "foreign_worker",
];

macro_rules! credit_schema {
    ($( $(#[$doc:meta])* $field:ident = $default:expr ),+ $(,)?) => {
        /// One applicant, in canonical feature order
        ///
        /// Absent keys take the placeholder defaults below. They are typical
        /// values, not statistics of the training data.
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct CreditApplication {
            $(
                $(#[$doc])*
                #[serde(deserialize_with = "lenient_f64")]
                pub $field: f64,
            )+
        }

        impl Default for CreditApplication {
            fn default() -> Self {
                Self { $( $field: $default as f64, )+ }
            }
        }

        /// Canonical feature order
        pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [ $( stringify!($field), )+ ];

        /// Default value per feature, in canonical order
        pub const FEATURE_DEFAULTS: [(&str, f64); FEATURE_COUNT] =
            [ $( (stringify!($field), $default as f64), )+ ];

        impl CreditApplication {
            /// Flatten into the canonical 20-element vector
            pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
                [ $( self.$field, )+ ]
            }

            /// Look up a feature by column name
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $( stringify!($field) => Some(self.$field), )+
                    _ => None,
                }
            }
        }
    };
}

/// Number of model features
pub const FEATURE_COUNT: usize = 20;

credit_schema! {
    /// Status of existing checking account (encoded)
    checking_account = 0,
    /// Loan duration in months
    duration = 12,
    /// Credit history (encoded)
    credit_history = 0,
    /// Loan purpose (encoded)
    purpose = 4,
    /// Credit amount
    credit_amount = 0,
    /// Savings account/bonds (encoded)
    savings_account = 0,
    /// Present employment since (encoded)
    employment = 1,
    /// Installment rate in percentage of disposable income
    installment_rate = 1,
    /// Personal status and sex (encoded)
    personal_status = 1,
    /// Other debtors / guarantors (encoded)
    other_debtors = 1,
    /// Present residence since
    residence_since = 1,
    /// Property (encoded)
    property = 1,
    /// Age in years
    age = 35,
    /// Other installment plans (encoded)
    other_installment_plans = 0,
    /// Housing (encoded)
    housing = 1,
    /// Number of existing credits at this bank
    existing_credits = 0,
    /// Job (encoded)
    job = 1,
    /// Number of people liable to provide maintenance for
    liable_people = 0,
    /// Telephone (encoded)
    telephone = 1,
    /// Foreign worker (encoded)
    foreign_worker = 0,
}

impl CreditApplication {
    /// Parse a JSON object of feature name to number.
    ///
    /// The top-level value must be an object; unknown keys are ignored and
    /// present keys must hold numbers, numeric strings or booleans.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Build from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected a JSON object of features, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value)
    }

    /// Lay the record out in an arbitrary column order.
    ///
    /// Returns the first unknown column name on failure.
    pub fn to_vector_in<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<f64>, String> {
        columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| name.to_string())
            })
            .collect()
    }
}

/// Position of a column in the canonical order
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|column| *column == name)
}

/// Whether the trainer label-encodes this column
pub fn is_categorical(name: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&name)
}

struct LenientF64;

impl<'de> Visitor<'de> for LenientF64 {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string or a boolean")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<f64, E> {
        Ok(if v { 1.0 } else { 0.0 })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(LenientF64)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
