use crate::error::{DepotError, Result};
use crate::types::{
    require, resolve_missing, type_name, value_cmp, SchemaType, TypeOptions,
};
use serde_json::Value;

/// Binary fields. In memory a buffer is an array of byte integers; the
/// persisted form is a lowercase hex string.
pub struct BufferType {
    options: TypeOptions,
}

impl BufferType {
    pub fn new(options: TypeOptions) -> Self {
        BufferType { options }
    }
}

/// Decode either representation to raw bytes.
fn to_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => hex::decode(s).ok(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().filter(|n| *n <= 255).map(|n| n as u8))
            .collect(),
        _ => None,
    }
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    Value::Array(bytes.into_iter().map(|b| Value::from(b as u64)).collect())
}

impl SchemaType for BufferType {
    fn name(&self) -> &'static str {
        "Buffer"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, &self.options).map(|v| match to_bytes(&v) {
            Some(bytes) => bytes_value(bytes),
            None => v,
        })
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_null() => match to_bytes(v) {
                Some(bytes) => Ok(Some(bytes_value(bytes))),
                None => Err(DepotError::Validation(format!(
                    "expected buffer, got {}",
                    type_name(v)
                ))),
            },
            _ => Ok(value),
        }
    }

    fn parse(&self, value: Option<&Value>) -> Option<Value> {
        let v = value?;
        match v.as_str().and_then(|s| hex::decode(s).ok()) {
            Some(bytes) => Some(bytes_value(bytes)),
            None => Some(v.clone()),
        }
    }

    fn export(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        let v = value?;
        match to_bytes(v) {
            Some(bytes) => Some(Value::String(hex::encode(bytes))),
            None => Some(v.clone()),
        }
    }

    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
        match (a.and_then(to_bytes), b.and_then(to_bytes)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => value_cmp(a, b),
        }
    }

    fn matches(&self, value: Option<&Value>, query: &Value, _doc: &Value) -> bool {
        match (value.and_then(to_bytes), to_bytes(query)) {
            (Some(x), Some(y)) => x == y,
            _ => match value {
                Some(v) => v == query,
                None => query.is_null(),
            },
        }
    }
}
