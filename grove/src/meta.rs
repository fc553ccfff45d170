//! Metadata property bags and their textual codec.
//!
//! Every node persists a string-keyed property bag as a sidecar file. The
//! bag is dynamically typed: values are strings, integers, floats,
//! booleans, null, or nested arrays/objects. The engine itself only
//! interprets the required `timeStep` key; everything else (retention
//! policy, aggregation method, ...) is carried through unexamined.
//!
//! The codec round-trips bags through a JSON-compatible textual form via
//! explicit match-based conversion to and from [`serde_json::Value`], so a
//! bag written by any JSON-producing tool decodes here and vice versa.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{MetaError, Result};

/// The metadata key every node is required to carry: seconds per point.
pub const TIME_STEP_KEY: &str = "timeStep";

/// A string-keyed metadata property bag.
///
/// Key order is not significant; the map is ordered only so that encoding
/// is deterministic.
pub type MetaBag = BTreeMap<String, MetaValue>;

/// A dynamically typed metadata value.
///
/// Integers are canonicalized: anything representable as `i64` decodes as
/// [`MetaValue::Int`], and `UInt` is used only for magnitudes beyond
/// `i64::MAX`. The `From` constructors apply the same rule, which is what
/// makes `decode(encode(bag))` reproduce equal values.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// An unsigned 64-bit integer beyond `i64::MAX`.
    UInt(u64),
    /// A 64-bit float. Must be finite to be encodable.
    Float(f64),
    /// A string.
    String(String),
    /// A nested array of values.
    Array(Vec<MetaValue>),
    /// A nested property bag.
    Object(MetaBag),
}

impl MetaValue {
    /// Returns the value as a signed integer if it is one, widening
    /// in-range unsigned values.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float if it is numeric.
    #[allow(clippy::cast_precision_loss)] // metadata floats are advisory
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// Converts the value to its JSON representation.
    fn to_json(&self) -> Result<Value> {
        let json = match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::UInt(u) => Value::from(*u),
            Self::Float(f) => {
                // serde_json has no representation for non-finite floats.
                match serde_json::Number::from_f64(*f) {
                    Some(n) => Value::Number(n),
                    None => {
                        return Err(MetaError::Encode {
                            reason: format!("non-finite float {f}"),
                        }
                        .into());
                    }
                }
            }
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json()?);
                }
                Value::Array(out)
            }
            Self::Object(bag) => Value::Object(bag_to_json(bag)?),
        };

        Ok(json)
    }

    /// Converts a JSON value to its bag representation.
    fn from_json(json: Value) -> Self {
        match json {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            }
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for MetaValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Self::Int(i),
            Err(_) => Self::UInt(u),
        }
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

fn bag_to_json(bag: &MetaBag) -> Result<serde_json::Map<String, Value>> {
    let mut map = serde_json::Map::with_capacity(bag.len());
    for (key, value) in bag {
        map.insert(key.clone(), value.to_json()?);
    }
    Ok(map)
}

/// Encodes a property bag to its textual form.
///
/// String values are quoted; numbers, booleans, and null are not. An empty
/// bag encodes to an empty object.
///
/// # Errors
///
/// Returns [`MetaError::Encode`] if the bag contains a non-finite float.
pub fn encode(bag: &MetaBag) -> Result<String> {
    let json = Value::Object(bag_to_json(bag)?);
    // Infallible once every value has a JSON representation.
    serde_json::to_string_pretty(&json).map_err(|e| {
        MetaError::Encode {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Decodes a property bag from its textual form.
///
/// # Errors
///
/// Returns [`MetaError::Parse`] if the text is not well-formed, or
/// [`MetaError::Decode`] if the top-level value is not an object.
pub fn decode(text: &str) -> Result<MetaBag> {
    let json: Value =
        serde_json::from_str(text).map_err(|source| MetaError::Parse { source })?;

    match json {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, MetaValue::from_json(v)))
            .collect()),
        other => Err(MetaError::Decode {
            reason: format!("top-level value is not an object: {other}"),
        }
        .into()),
    }
}

/// Extracts the required `timeStep` key from a bag as a positive integer.
pub fn time_step(bag: &MetaBag) -> Option<i64> {
    bag.get(TIME_STEP_KEY)
        .and_then(MetaValue::as_int)
        .filter(|step| *step > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bag() -> MetaBag {
        let mut bag = MetaBag::new();
        bag.insert(TIME_STEP_KEY.to_string(), MetaValue::from(60i64));
        bag.insert("retention".to_string(), MetaValue::from("7d"));
        bag.insert("weight".to_string(), MetaValue::from(0.5f64));
        bag.insert("sparse".to_string(), MetaValue::from(true));
        bag.insert("comment".to_string(), MetaValue::Null);
        bag.insert(
            "aggregates".to_string(),
            MetaValue::Array(vec![
                MetaValue::from("avg"),
                MetaValue::from("max"),
            ]),
        );
        bag
    }

    #[test]
    fn test_round_trip_all_value_kinds() {
        let mut bag = sample_bag();
        bag.insert("big".to_string(), MetaValue::from(u64::MAX));
        bag.insert("negative".to_string(), MetaValue::from(-42i64));

        let mut nested = MetaBag::new();
        nested.insert("inner".to_string(), MetaValue::from(1i64));
        bag.insert("nested".to_string(), MetaValue::Object(nested));

        let text = encode(&bag).unwrap();
        let decoded = decode(&text).unwrap();

        assert_eq!(decoded, bag);
    }

    #[test]
    fn test_empty_bag_encodes_to_empty_object() {
        let bag = MetaBag::new();
        let text = encode(&bag).unwrap();
        assert_eq!(text.trim(), "{}");
        assert_eq!(decode(&text).unwrap(), bag);
    }

    #[test]
    fn test_strings_quoted_numbers_not() {
        let mut bag = MetaBag::new();
        bag.insert("name".to_string(), MetaValue::from("cpu"));
        bag.insert("step".to_string(), MetaValue::from(60i64));

        let text = encode(&bag).unwrap();
        assert!(text.contains("\"cpu\""));
        assert!(text.contains("60"));
        assert!(!text.contains("\"60\""));
    }

    #[test]
    fn test_malformed_text_fails_to_decode() {
        assert!(decode("{ not json }").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn test_non_object_top_level_rejected() {
        assert!(decode("[1, 2, 3]").is_err());
        assert!(decode("42").is_err());
        assert!(decode("\"bag\"").is_err());
    }

    #[test]
    fn test_non_finite_float_unencodable() {
        let mut bag = MetaBag::new();
        bag.insert("bad".to_string(), MetaValue::Float(f64::NAN));
        assert!(encode(&bag).is_err());

        let mut bag = MetaBag::new();
        bag.insert("bad".to_string(), MetaValue::Float(f64::INFINITY));
        assert!(encode(&bag).is_err());
    }

    #[test]
    fn test_integer_canonicalization() {
        // Small unsigned values collapse to Int so round-trips compare equal.
        assert_eq!(MetaValue::from(5u64), MetaValue::Int(5));
        assert_eq!(MetaValue::from(u64::MAX), MetaValue::UInt(u64::MAX));

        let decoded = decode("{\"a\": 5, \"b\": 18446744073709551615}").unwrap();
        assert_eq!(decoded["a"], MetaValue::Int(5));
        assert_eq!(decoded["b"], MetaValue::UInt(u64::MAX));
    }

    #[test]
    fn test_time_step_extraction() {
        let bag = sample_bag();
        assert_eq!(time_step(&bag), Some(60));

        let mut bag = MetaBag::new();
        assert_eq!(time_step(&bag), None);

        bag.insert(TIME_STEP_KEY.to_string(), MetaValue::from("60"));
        assert_eq!(time_step(&bag), None);

        bag.insert(TIME_STEP_KEY.to_string(), MetaValue::from(0i64));
        assert_eq!(time_step(&bag), None);

        bag.insert(TIME_STEP_KEY.to_string(), MetaValue::from(-60i64));
        assert_eq!(time_step(&bag), None);
    }

    #[test]
    fn test_decodes_foreign_json() {
        // Metadata written by other tooling decodes as long as it is JSON.
        let decoded =
            decode("{\"timeStep\": 10, \"owner\": {\"team\": \"infra\"}}").unwrap();
        assert_eq!(time_step(&decoded), Some(10));
        match &decoded["owner"] {
            MetaValue::Object(owner) => {
                assert_eq!(owner["team"], MetaValue::from("infra"));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }
}
