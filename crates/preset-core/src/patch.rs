//! Typed patches for structured-document merges
//!
//! A patch is an ordered mapping of keys to [`PatchValue`]s. Values are a
//! recursive variant of scalar, sequence and mapping so that the merge rules
//! in [`crate::engine`] are defined for every shape a preset can express.
//!
//! Patches deserialize from any serde format (presets use YAML) by going
//! through `serde_json::Value`, which keeps key order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Leaf value of a patch
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// A value inside a structured patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PatchValue {
    Scalar(Scalar),
    Sequence(Vec<PatchValue>),
    Mapping(Patch),
}

impl PatchValue {
    pub fn to_value(&self) -> Value {
        match self {
            PatchValue::Scalar(Scalar::Null) => Value::Null,
            PatchValue::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            PatchValue::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            PatchValue::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            PatchValue::Sequence(items) => {
                Value::Array(items.iter().map(PatchValue::to_value).collect())
            }
            PatchValue::Mapping(patch) => Value::Object(patch.to_map()),
        }
    }

    pub fn as_mapping(&self) -> Option<&Patch> {
        match self {
            PatchValue::Mapping(patch) => Some(patch),
            _ => None,
        }
    }
}

impl From<Value> for PatchValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PatchValue::Scalar(Scalar::Null),
            Value::Bool(b) => PatchValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => PatchValue::Scalar(Scalar::Number(n)),
            Value::String(s) => PatchValue::Scalar(Scalar::String(s)),
            Value::Array(items) => {
                PatchValue::Sequence(items.into_iter().map(PatchValue::from).collect())
            }
            Value::Object(map) => PatchValue::Mapping(Patch::from(map)),
        }
    }
}

impl From<PatchValue> for Value {
    fn from(value: PatchValue) -> Self {
        value.to_value()
    }
}

impl From<&str> for PatchValue {
    fn from(s: &str) -> Self {
        PatchValue::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for PatchValue {
    fn from(s: String) -> Self {
        PatchValue::Scalar(Scalar::String(s))
    }
}

impl From<bool> for PatchValue {
    fn from(b: bool) -> Self {
        PatchValue::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for PatchValue {
    fn from(n: i64) -> Self {
        PatchValue::Scalar(Scalar::Number(n.into()))
    }
}

impl From<Patch> for PatchValue {
    fn from(patch: Patch) -> Self {
        PatchValue::Mapping(patch)
    }
}

impl<T: Into<PatchValue>> From<Vec<T>> for PatchValue {
    fn from(items: Vec<T>) -> Self {
        PatchValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Ordered mapping of keys to patch values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Patch {
    entries: Vec<(String, PatchValue)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Setting a key twice keeps its first position
    /// and the last value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PatchValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PatchValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatchValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect()
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(k, v)| (k, PatchValue::from(v)))
                .collect(),
        }
    }
}

impl TryFrom<Value> for Patch {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Patch::from(map)),
            Value::Null => Ok(Patch::new()),
            other => Err(format!("patch must be a mapping, found {}", other)),
        }
    }
}

impl From<Patch> for Value {
    fn from(patch: Patch) -> Self {
        Value::Object(patch.to_map())
    }
}
