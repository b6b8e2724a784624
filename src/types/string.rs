use crate::error::{DepotError, Result};
use crate::types::{require, resolve_missing, type_name, SchemaType, TypeOptions};
use serde_json::Value;

pub struct StringType {
    options: TypeOptions,
}

impl StringType {
    pub fn new(options: TypeOptions) -> Self {
        StringType { options }
    }
}

impl SchemaType for StringType {
    fn name(&self) -> &'static str {
        "String"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    /// Numbers and booleans are stringified on ingress; anything else is
    /// left for `validate` to reject.
    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, &self.options).map(|v| match v {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other,
        })
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_string() && !v.is_null() => Err(DepotError::Validation(format!(
                "expected string, got {}",
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
    fn test_cast_stringifies_scalars() {
        let ty = StringType::new(TypeOptions::default());
        assert_eq!(ty.cast(Some(&json!(42)), &json!({})), Some(json!("42")));
        assert_eq!(ty.cast(Some(&json!(true)), &json!({})), Some(json!("true")));
        assert_eq!(ty.cast(Some(&json!("x")), &json!({})), Some(json!("x")));
    }

    #[test]
    fn test_validate_rejects_non_string() {
        let ty = StringType::new(TypeOptions::default());
        let mut doc = json!({});
        assert!(ty.validate(Some(&json!([1])), &mut doc).is_err());
        assert_eq!(
            ty.validate(Some(&json!("ok")), &mut doc).unwrap(),
            Some(json!("ok"))
        );
    }
}
