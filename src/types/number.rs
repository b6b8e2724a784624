use crate::error::{DepotError, Result};
use crate::types::{
    base_update_operator, require, resolve_missing, type_name, SchemaType, TypeOptions,
    UpdateOperator,
};
use serde_json::{Number, Value};

pub struct NumberType {
    options: TypeOptions,
}

impl NumberType {
    pub fn new(options: TypeOptions) -> Self {
        NumberType { options }
    }
}

/// Arithmetic over JSON numbers; stays integral when both operands are.
fn arith(current: Option<&Value>, arg: &Value, op: fn(f64, f64) -> f64) -> Result<Value> {
    let rhs = arg
        .as_f64()
        .ok_or_else(|| DepotError::Type("numeric operator expects a number argument".into()))?;
    let lhs = current.and_then(Value::as_f64).unwrap_or(0.0);

    let integral = current.map_or(true, |v| v.as_i64().is_some()) && arg.as_i64().is_some();
    let out = op(lhs, rhs);
    if integral {
        Ok(Value::Number(Number::from(out as i64)))
    } else {
        Number::from_f64(out)
            .map(Value::Number)
            .ok_or_else(|| DepotError::Type("numeric operator produced a non-finite value".into()))
    }
}

impl SchemaType for NumberType {
    fn name(&self) -> &'static str {
        "Number"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    /// Numeric strings and booleans coerce on ingress.
    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, &self.options).map(|v| match v {
            Value::String(s) => {
                if let Ok(n) = s.parse::<i64>() {
                    Value::Number(Number::from(n))
                } else if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
                    Value::Number(n)
                } else {
                    Value::String(s)
                }
            }
            Value::Bool(b) => Value::Number(Number::from(b as i64)),
            other => other,
        })
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_number() && !v.is_null() => Err(DepotError::Validation(format!(
                "expected number, got {}",
                type_name(v)
            ))),
            _ => Ok(value),
        }
    }

    fn update_operator(&self, name: &str) -> Option<UpdateOperator> {
        let op: UpdateOperator = match name {
            "$inc" => |_ty, value, arg, _doc, _path| arith(value, arg, |a, b| a + b).map(Some),
            "$dec" => |_ty, value, arg, _doc, _path| arith(value, arg, |a, b| a - b).map(Some),
            "$mul" => |_ty, value, arg, _doc, _path| arith(value, arg, |a, b| a * b).map(Some),
            _ => return base_update_operator(name),
        };
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cast_coerces_strings() {
        let ty = NumberType::new(TypeOptions::default());
        assert_eq!(ty.cast(Some(&json!("42")), &json!({})), Some(json!(42)));
        assert_eq!(ty.cast(Some(&json!("1.5")), &json!({})), Some(json!(1.5)));
        assert_eq!(ty.cast(Some(&json!(true)), &json!({})), Some(json!(1)));
        // Unparseable strings pass through for validate to reject.
        assert_eq!(ty.cast(Some(&json!("abc")), &json!({})), Some(json!("abc")));
    }

    #[test]
    fn test_validate_rejects_non_number() {
        let ty = NumberType::new(TypeOptions::default());
        let mut doc = json!({});
        assert!(ty.validate(Some(&json!("abc")), &mut doc).is_err());
        assert!(ty.validate(Some(&json!(3)), &mut doc).is_ok());
    }

    #[test]
    fn test_inc_dec_mul() {
        let ty = NumberType::new(TypeOptions::default());
        let mut doc = json!({});

        let inc = ty.update_operator("$inc").unwrap();
        assert_eq!(
            inc(&ty, Some(&json!(5)), &json!(1), &mut doc, "n").unwrap(),
            Some(json!(6))
        );
        // Missing value starts from zero.
        assert_eq!(inc(&ty, None, &json!(3), &mut doc, "n").unwrap(), Some(json!(3)));

        let dec = ty.update_operator("$dec").unwrap();
        assert_eq!(
            dec(&ty, Some(&json!(5)), &json!(2), &mut doc, "n").unwrap(),
            Some(json!(3))
        );

        let mul = ty.update_operator("$mul").unwrap();
        assert_eq!(
            mul(&ty, Some(&json!(2.5)), &json!(2), &mut doc, "n").unwrap(),
            Some(json!(5.0))
        );
    }

    #[test]
    fn test_base_operators_still_reachable() {
        let ty = NumberType::new(TypeOptions::default());
        assert!(ty.update_operator("$set").is_some());
        assert!(ty.update_operator("$bogus").is_none());
    }
}
