// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed attribute values and feature identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage type of an attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Double,
    Text,
}

impl FieldType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Double => "double",
            FieldType::Text => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed attribute value.
///
/// Serialized untagged so JSON scalars map directly; variant order makes
/// `1` an integer and `1.5` a double.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to the storage type of `field`. Null passes through.
    ///
    /// Integral doubles become integers and numbers widen to doubles;
    /// anything else that would lose information is rejected.
    pub fn coerce(self, field: &str, field_type: FieldType) -> Result<FieldValue> {
        let invalid = |value: &FieldValue| Error::InvalidValue {
            field: field.to_string(),
            field_type,
            value: value.to_string(),
        };

        match (field_type, self) {
            (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldType::Integer, FieldValue::Integer(v)) => Ok(FieldValue::Integer(v)),
            (FieldType::Integer, FieldValue::Double(v))
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 =>
            {
                Ok(FieldValue::Integer(v as i64))
            }
            (FieldType::Double, FieldValue::Integer(v)) => Ok(FieldValue::Double(v as f64)),
            (FieldType::Double, FieldValue::Double(v)) => Ok(FieldValue::Double(v)),
            (FieldType::Text, FieldValue::Text(s)) => Ok(FieldValue::Text(s)),
            (_, other) => Err(invalid(&other)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Double(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Identifier of a building or tile.
///
/// Ordering is total: all integer ids sort before all text ids, integers
/// numerically, text lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Int(i64),
    Text(String),
}

impl FeatureId {
    /// Read an identifier from an attribute value.
    pub fn from_value(value: &FieldValue) -> Option<FeatureId> {
        match value {
            FieldValue::Integer(v) => Some(FeatureId::Int(*v)),
            FieldValue::Double(v) if v.fract() == 0.0 => Some(FeatureId::Int(*v as i64)),
            FieldValue::Text(s) => Some(FeatureId::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric form of the id; text ids holding an integer parse too.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FeatureId::Int(v) => Some(*v),
            FeatureId::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn to_value(&self) -> FieldValue {
        match self {
            FeatureId::Int(v) => FieldValue::Integer(*v),
            FeatureId::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Int(v) => write!(f, "{}", v),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(v: i64) -> Self {
        FeatureId::Int(v)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_sort_before_text() {
        let mut ids = vec![
            FeatureId::from("b"),
            FeatureId::from(10),
            FeatureId::from("a"),
            FeatureId::from(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                FeatureId::from(2),
                FeatureId::from(10),
                FeatureId::from("a"),
                FeatureId::from("b"),
            ]
        );
    }

    #[test]
    fn untagged_json_values() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[null, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Integer(3),
                FieldValue::Double(2.5),
                FieldValue::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn coerce_widens_and_narrows() {
        assert_eq!(
            FieldValue::Integer(4).coerce("a", FieldType::Double).unwrap(),
            FieldValue::Double(4.0)
        );
        assert_eq!(
            FieldValue::Double(7.0).coerce("a", FieldType::Integer).unwrap(),
            FieldValue::Integer(7)
        );
        assert!(matches!(
            FieldValue::Double(7.5).coerce("a", FieldType::Integer),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            FieldValue::Text("7".into()).coerce("a", FieldType::Double),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn id_from_value() {
        assert_eq!(
            FeatureId::from_value(&FieldValue::Double(3.0)),
            Some(FeatureId::Int(3))
        );
        assert_eq!(FeatureId::from_value(&FieldValue::Double(3.5)), None);
        assert_eq!(FeatureId::from_value(&FieldValue::Null), None);
        assert_eq!(FeatureId::from(" 42 ").as_i64(), Some(42));
    }
}
