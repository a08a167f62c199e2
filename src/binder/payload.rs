//! JSON parameter payloads.
//!
//! Indexed: `[1, "a", {"value": 2}]`. Named: `[{"name": "id", "type": "BIGINT", "value": 1}]`.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::core::{MarshalError, Result, Value};

/// Ordered values for positional binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedParams(Vec<Value>);

impl IndexedParams {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Elements are converted as-is; `{"value": ..}` objects are unwrapped at bind time.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match json {
            JsonValue::Array(items) => Ok(Self(items.iter().map(Value::from_json).collect())),
            other => Err(MarshalError::binding(format!(
                "Indexed parameters must be a JSON array, got {}",
                other
            ))),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One `{name, type, value}` record for named binding.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    pub name: String,
    /// Database type name, matched case-insensitively.
    pub type_name: String,
    pub value: Value,
}

#[derive(Deserialize)]
struct NamedParamJson {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    value: JsonValue,
}

impl NamedParam {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let record: NamedParamJson = serde_json::from_value(json.clone()).map_err(|err| {
            MarshalError::binding_caused_by(format!("Malformed named parameter {}", json), err)
        })?;

        Ok(Self {
            name: record.name.trim_start_matches(':').to_string(),
            type_name: record.type_name,
            value: Value::from_json(&record.value),
        })
    }

    pub fn list_from_json(json: &JsonValue) -> Result<Vec<Self>> {
        match json {
            JsonValue::Array(items) => items.iter().map(Self::from_json).collect(),
            other => Err(MarshalError::binding(format!(
                "Named parameters must be a JSON array, got {}",
                other
            ))),
        }
    }
}
