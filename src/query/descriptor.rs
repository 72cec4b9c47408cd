//! Query descriptors: ordered filter/sort/limit clauses.

use crate::error::{BindingError, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upper bound on sort keys in one descriptor.
pub(crate) const MAX_SORT_FIELDS: usize = 8;

/// Scalar value an equality filter compares against.
///
/// Integers must fit in `i64`. A wider integer is rejected rather than
/// widened to a float.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    /// Whether a document value is equal to this filter value.
    ///
    /// Integers and floats compare numerically, so `3` matches `3.0`.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldValue::Null, Value::Null) => true,
            (FieldValue::Bool(a), Value::Bool(b)) => a == b,
            (FieldValue::Int(a), Value::Number(n)) => match n.as_i64() {
                Some(b) => *a == b,
                None => n.as_f64() == Some(*a as f64),
            },
            (FieldValue::Float(a), Value::Number(n)) => n.as_f64() == Some(*a),
            (FieldValue::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a boolean, a number in i64/f64 range, or a string")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FieldValue, E> {
        i64::try_from(v)
            .map(FieldValue::Int)
            .map_err(|_| E::custom(format!("integer {} does not fit in i64", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::String(v))
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A single constraint clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Clause {
    /// Keep documents whose `field` equals `value`.
    Equals { field: String, value: FieldValue },

    /// Sort by `field`.
    OrderBy {
        field: String,
        #[serde(default)]
        direction: SortDirection,
    },

    /// Keep at most `count` documents.
    Limit { count: usize },
}

/// Equality filter clause.
pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Clause {
    Clause::Equals {
        field: field.into(),
        value: value.into(),
    }
}

/// Sort clause.
pub fn order_by(field: impl Into<String>, direction: SortDirection) -> Clause {
    Clause::OrderBy {
        field: field.into(),
        direction,
    }
}

/// Limit clause.
pub fn limit(count: usize) -> Clause {
    Clause::Limit { count }
}

/// Ordered sequence of constraint clauses.
///
/// Clause order is significant for identity: two descriptors with the same
/// clauses in a different order resolve to different identities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryDescriptor {
    clauses: Vec<Clause>,
}

impl QueryDescriptor {
    /// Empty descriptor: every document, default order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON wire form, an array of `{"op": ...}` objects.
    pub fn from_json(value: &Value) -> Result<Self> {
        let descriptor: QueryDescriptor = serde_json::from_value(value.clone())
            .map_err(|e| BindingError::invalid(format!("malformed clause list: {}", e)))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.clauses.push(equals(field, value));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.clauses.push(order_by(field, direction));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.clauses.push(limit(count));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check every clause is well formed.
    pub fn validate(&self) -> Result<()> {
        let mut limits = 0usize;
        let mut sorts = 0usize;

        for (pos, clause) in self.clauses.iter().enumerate() {
            match clause {
                Clause::Equals { field, value } => {
                    if field.trim().is_empty() {
                        return Err(BindingError::invalid(format!(
                            "clause {}: equality filter has an empty field name",
                            pos
                        )));
                    }
                    if let FieldValue::Float(x) = value {
                        if x.is_nan() {
                            return Err(BindingError::invalid(format!(
                                "clause {}: cannot filter {} on NaN",
                                pos, field
                            )));
                        }
                    }
                }
                Clause::OrderBy { field, .. } => {
                    if field.trim().is_empty() {
                        return Err(BindingError::invalid(format!(
                            "clause {}: sort has an empty field name",
                            pos
                        )));
                    }
                    sorts += 1;
                    if sorts > MAX_SORT_FIELDS {
                        return Err(BindingError::invalid(format!(
                            "more than {} sort clauses",
                            MAX_SORT_FIELDS
                        )));
                    }
                }
                Clause::Limit { count } => {
                    if *count == 0 {
                        return Err(BindingError::invalid(format!(
                            "clause {}: limit must be positive",
                            pos
                        )));
                    }
                    limits += 1;
                    if limits > 1 {
                        return Err(BindingError::invalid(format!(
                            "clause {}: only one limit clause is allowed",
                            pos
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub(crate) fn limit_count(&self) -> Option<usize> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Limit { count } => Some(*count),
            _ => None,
        })
    }
}

impl From<Vec<Clause>> for QueryDescriptor {
    fn from(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }
}

impl FromIterator<Clause> for QueryDescriptor {
    fn from_iter<I: IntoIterator<Item = Clause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}
