use crate::error::{DepotError, Result};
use crate::types::{
    base_query_operator, base_update_operator, require, resolve_missing, type_name, value_cmp,
    QueryOperator, SchemaType, TypeOptions, UpdateOperator,
};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Array fields, parameterized by a child type applied element-wise on
/// every pipeline stage. Arrays are always manipulated whole; the path
/// accessor never indexes into them.
pub struct ArrayType {
    child: Arc<dyn SchemaType>,
    options: TypeOptions,
}

impl ArrayType {
    pub fn new(child: Arc<dyn SchemaType>, options: TypeOptions) -> Self {
        ArrayType { child, options }
    }

    pub fn child(&self) -> &Arc<dyn SchemaType> {
        &self.child
    }
}

fn current_items(value: Option<&Value>) -> Result<Vec<Value>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(v) => Err(DepotError::Type(format!(
            "array operator applied to {}",
            type_name(v)
        ))),
    }
}

/// The operator argument, treated as a collection: arrays contribute their
/// elements, scalars themselves.
fn arg_items(arg: &Value) -> Vec<Value> {
    match arg {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

impl SchemaType for ArrayType {
    fn name(&self) -> &'static str {
        "Array"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    /// Scalars are wrapped into a single-element array; elements are cast
    /// through the child type.
    fn cast(&self, value: Option<&Value>, doc: &Value) -> Option<Value> {
        let v = resolve_missing(value, &self.options)?;
        let items = match v {
            Value::Array(items) => items,
            other => vec![other],
        };
        Some(Value::Array(
            items
                .into_iter()
                .map(|item| self.child.cast(Some(&item), doc).unwrap_or(item))
                .collect(),
        ))
    }

    fn validate(&self, value: Option<&Value>, doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match value {
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    out.push(self.child.validate(Some(item), doc)?.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(out)))
            }
            Some(v) if !v.is_null() => Err(DepotError::Validation(format!(
                "expected array, got {}",
                type_name(&v)
            ))),
            other => Ok(other),
        }
    }

    fn parse(&self, value: Option<&Value>) -> Option<Value> {
        let v = value?;
        match v {
            Value::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| self.child.parse(Some(item)).unwrap_or_else(|| item.clone()))
                    .collect(),
            )),
            other => Some(other.clone()),
        }
    }

    fn export(&self, value: Option<&Value>, doc: &Value) -> Option<Value> {
        let v = value?;
        match v {
            Value::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| {
                        self.child
                            .export(Some(item), doc)
                            .unwrap_or_else(|| item.clone())
                    })
                    .collect(),
            )),
            other => Some(other.clone()),
        }
    }

    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (Some(Value::Array(x)), Some(Value::Array(y))) => {
                for (ex, ey) in x.iter().zip(y.iter()) {
                    let ord = self.child.compare(Some(ex), Some(ey));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                x.len().cmp(&y.len())
            }
            _ => value_cmp(a, b),
        }
    }

    /// An array query matches whole; a scalar query matches containment.
    fn matches(&self, value: Option<&Value>, query: &Value, doc: &Value) -> bool {
        match (value, query) {
            (Some(Value::Array(items)), q) if !q.is_array() => items
                .iter()
                .any(|item| self.child.matches(Some(item), q, doc)),
            (Some(v), q) => v == q,
            (None, q) => q.is_null(),
        }
    }

    /// Population resolves through the element type's reference.
    fn reference(&self) -> Option<&str> {
        self.child
            .reference()
            .or_else(|| self.options.reference.as_deref())
    }

    fn query_operator(&self, name: &str) -> Option<QueryOperator> {
        let op: QueryOperator = match name {
            "$size" => |_ty, value, query, _doc| match value {
                Some(Value::Array(items)) => query.as_u64() == Some(items.len() as u64),
                _ => false,
            },
            "$in" => |_ty, value, query, _doc| match (value, query.as_array()) {
                (Some(Value::Array(items)), Some(candidates)) => {
                    items.iter().any(|item| candidates.contains(item))
                }
                _ => false,
            },
            "$nin" => |_ty, value, query, _doc| match (value, query.as_array()) {
                (Some(Value::Array(items)), Some(candidates)) => {
                    !items.iter().any(|item| candidates.contains(item))
                }
                _ => true,
            },
            "$all" => |_ty, value, query, _doc| match (value, query.as_array()) {
                (Some(Value::Array(items)), Some(wanted)) => {
                    wanted.iter().all(|w| items.contains(w))
                }
                _ => false,
            },
            _ => return base_query_operator(name),
        };
        Some(op)
    }

    fn update_operator(&self, name: &str) -> Option<UpdateOperator> {
        let op: UpdateOperator = match name {
            "$push" => |_ty, value, arg, _doc, _path| {
                let mut items = current_items(value)?;
                items.extend(arg_items(arg));
                Ok(Some(Value::Array(items)))
            },
            "$unshift" => |_ty, value, arg, _doc, _path| {
                let mut items = arg_items(arg);
                items.extend(current_items(value)?);
                Ok(Some(Value::Array(items)))
            },
            "$pull" => |_ty, value, arg, _doc, _path| {
                let mut items = current_items(value)?;
                let unwanted = arg_items(arg);
                items.retain(|item| !unwanted.contains(item));
                Ok(Some(Value::Array(items)))
            },
            "$shift" => |_ty, value, arg, _doc, _path| {
                let mut items = current_items(value)?;
                let n = arg.as_i64().ok_or_else(|| {
                    DepotError::Type("$shift expects a number argument".into())
                })?;
                if n >= 0 {
                    items.drain(..(n as usize).min(items.len()));
                } else {
                    let keep = items.len().saturating_sub((-n) as usize);
                    items.truncate(keep);
                }
                Ok(Some(Value::Array(items)))
            },
            "$pop" => |_ty, value, arg, _doc, _path| {
                let mut items = current_items(value)?;
                let n = arg.as_i64().ok_or_else(|| {
                    DepotError::Type("$pop expects a number argument".into())
                })?;
                if n >= 0 {
                    items.pop();
                } else if !items.is_empty() {
                    items.remove(0);
                }
                Ok(Some(Value::Array(items)))
            },
            "$addToSet" => |_ty, value, arg, _doc, _path| {
                let mut items = current_items(value)?;
                for candidate in arg_items(arg) {
                    if !items.contains(&candidate) {
                        items.push(candidate);
                    }
                }
                Ok(Some(Value::Array(items)))
            },
            _ => return base_update_operator(name),
        };
        Some(op)
    }
}
