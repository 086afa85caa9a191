#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::Serialize;

use crate::eval::{Assignment, Scalar};

/// A value as reported by a solver model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ModelValue {
    Bool(bool),
    Int(i64),
    Rational { num: i64, den: i64 },
}

impl ModelValue {
    /// Rationals decode to `num / den` as a float.
    pub fn to_scalar(self) -> Scalar {
        match self {
            ModelValue::Bool(b) => Scalar::Bool(b),
            ModelValue::Int(n) => Scalar::Int(n),
            ModelValue::Rational { num, den } => Scalar::Real(num as f64 / den as f64),
        }
    }
}

/// Satisfying assignment returned by a backend, keyed by constant name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Model {
    pub values: BTreeMap<String, ModelValue>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ModelValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<ModelValue> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ModelValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn to_assignment(&self) -> Assignment {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_scalar()))
            .collect()
    }
}

impl FromIterator<(String, ModelValue)> for Model {
    fn from_iter<I: IntoIterator<Item = (String, ModelValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
