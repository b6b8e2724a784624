use crate::error::{DepotError, Result};
use crate::types::{require, resolve_missing, type_name, SchemaType, TypeOptions};
use serde_json::Value;

/// The type behind nested plain-object declarations. Child paths carry
/// their own types; the parent only guards the grouping value itself.
pub struct ObjectType {
    options: TypeOptions,
}

impl ObjectType {
    pub fn new(options: TypeOptions) -> Self {
        ObjectType { options }
    }
}

impl SchemaType for ObjectType {
    fn name(&self) -> &'static str {
        "Object"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_object() && !v.is_null() => Err(DepotError::Validation(format!(
                "expected object, got {}",
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
    fn test_validate() {
        let ty = ObjectType::new(TypeOptions::default());
        let mut doc = json!({});
        assert!(ty.validate(Some(&json!({"a": 1})), &mut doc).is_ok());
        assert!(ty.validate(Some(&json!("x")), &mut doc).is_err());
        assert!(ty.validate(None, &mut doc).unwrap().is_none());
    }
}
