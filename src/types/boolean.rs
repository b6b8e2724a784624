use crate::error::{DepotError, Result};
use crate::types::{require, resolve_missing, type_name, SchemaType, TypeOptions};
use serde_json::Value;

pub struct BooleanType {
    options: TypeOptions,
}

impl BooleanType {
    pub fn new(options: TypeOptions) -> Self {
        BooleanType { options }
    }
}

impl SchemaType for BooleanType {
    fn name(&self) -> &'static str {
        "Boolean"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, &self.options).map(|v| match v {
            Value::String(s) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 0.0 => Value::Bool(false),
                Some(f) if f == 1.0 => Value::Bool(true),
                _ => Value::Number(n),
            },
            other => other,
        })
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_boolean() && !v.is_null() => Err(DepotError::Validation(format!(
                "expected boolean, got {}",
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
    fn test_cast_coercions() {
        let ty = BooleanType::new(TypeOptions::default());
        assert_eq!(ty.cast(Some(&json!("true")), &json!({})), Some(json!(true)));
        assert_eq!(ty.cast(Some(&json!(0)), &json!({})), Some(json!(false)));
        assert_eq!(ty.cast(Some(&json!(1)), &json!({})), Some(json!(true)));
        assert_eq!(ty.cast(Some(&json!(false)), &json!({})), Some(json!(false)));
    }

    #[test]
    fn test_validate() {
        let ty = BooleanType::new(TypeOptions::default());
        let mut doc = json!({});
        assert!(ty.validate(Some(&json!("yes")), &mut doc).is_err());
        assert!(ty.validate(Some(&json!(true)), &mut doc).is_ok());
    }
}
