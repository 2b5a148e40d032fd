//! Claim set extracted from a verified token.
//!
//! Claims are an untyped name -> JSON value mapping. Policy evaluation only
//! understands string and string-array values, so lookup classifies the raw
//! JSON into a tagged variant the evaluator can dispatch on.

use serde_json::{Map, Value};

/// A claim value as seen by the policy evaluator.
#[derive(Debug, PartialEq, Eq)]
pub enum ClaimValue<'a> {
    /// A single string value.
    Scalar(&'a str),

    /// An ordered sequence of string values. May be empty.
    Sequence(Vec<&'a str>),

    /// Any other JSON shape (number, bool, object, mixed array, null).
    /// Never satisfies a policy constraint.
    Other,
}

/// Immutable claim mapping from a verified token.
#[derive(Debug, Clone)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Raw JSON value of a claim, if present.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Classified claim value, or `None` when the claim is absent.
    ///
    /// An array classifies as `Sequence` only when every element is a
    /// string; anything else is `Other`.
    pub fn get(&self, name: &str) -> Option<ClaimValue<'_>> {
        let value = self.0.get(name)?;

        Some(match value {
            Value::String(s) => ClaimValue::Scalar(s),
            Value::Array(items) => {
                let mut strings = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => strings.push(s),
                        None => return Some(ClaimValue::Other),
                    }
                }
                ClaimValue::Sequence(strings)
            }
            _ => ClaimValue::Other,
        })
    }
}
