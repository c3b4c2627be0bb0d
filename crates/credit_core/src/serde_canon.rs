//! Canonical JSON serialization for model artifacts
//!
//! Object keys are sorted recursively so the same forest always serializes
//! to the same bytes, which keeps BLAKE3 digests stable between runs.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Serialize a value to compact canonical JSON
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    Ok(serde_json::to_string(&canonical)?)
}

/// Serialize a value to indented canonical JSON (used for files on disk)
pub fn to_canonical_json_pretty<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    Ok(serde_json::to_string_pretty(&canonical)?)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, canonicalize(val));
            }
            Value::Object(sorted)
        }
        Value::Array(elements) => Value::Array(elements.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// BLAKE3 digest of raw bytes as lowercase hex
fn hash_bytes_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// BLAKE3 digest of the canonical JSON form as lowercase hex
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(hash_bytes_hex(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Unordered {
        zeta: f64,
        alpha: Vec<i32>,
        mid: Inner,
    }

    #[derive(Serialize)]
    struct Inner {
        y: bool,
        b: &'static str,
    }

    fn sample() -> Unordered {
        Unordered {
            zeta: 0.5,
            alpha: vec![3, 1, 2],
            mid: Inner { y: true, b: "x" },
        }
    }

    #[test]
    fn test_keys_sorted_recursively() {
        let json = to_canonical_json(&sample()).unwrap();
        assert_eq!(json, r#"{"alpha":[3,1,2],"mid":{"b":"x","y":true},"zeta":0.5}"#);
    }

    #[test]
    fn test_pretty_has_same_content() {
        let pretty = to_canonical_json_pretty(&sample()).unwrap();
        let compact = to_canonical_json(&sample()).unwrap();
        let a: Value = serde_json::from_str(&pretty).unwrap();
        let b: Value = serde_json::from_str(&compact).unwrap();
        assert_eq!(a, b);
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn test_hash_stable() {
        let h1 = hash_canonical_hex(&sample()).unwrap();
        let h2 = hash_canonical_hex(&sample()).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, hash_bytes_hex(b"something else"));
    }
}
