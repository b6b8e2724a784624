use crate::error::{DepotError, Result};
use crate::types::{require, resolve_missing, type_name, SchemaType, TypeOptions};
use serde_json::Value;

/// Identifier fields: string ids, usually carrying a `reference` option
/// naming the model they point at. Allocation of fresh ids belongs to the
/// collection layer.
pub struct IdType {
    options: TypeOptions,
}

impl IdType {
    pub fn new(options: TypeOptions) -> Self {
        IdType { options }
    }
}

impl SchemaType for IdType {
    fn name(&self) -> &'static str {
        "Id"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, &self.options).map(|v| match v {
            Value::Number(n) => Value::String(n.to_string()),
            other => other,
        })
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_string() && !v.is_null() => Err(DepotError::Validation(format!(
                "expected id string, got {}",
                type_name(v)
            ))),
            _ => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cast_and_validate() {
        let ty = IdType::new(TypeOptions {
            reference: Some("User".into()),
            ..TypeOptions::default()
        });
        let mut doc = json!({});
        assert_eq!(ty.cast(Some(&json!(42)), &json!({})), Some(json!("42")));
        assert!(ty.validate(Some(&json!("abc123")), &mut doc).is_ok());
        assert!(ty.validate(Some(&json!({})), &mut doc).is_err());
        assert_eq!(ty.reference(), Some("User"));
    }
}
