use crate::error::{DepotError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub mod array;
pub mod boolean;
pub mod buffer;
pub mod date;
pub mod id;
pub mod number;
pub mod object;
pub mod string;
pub mod virtuals;

pub use array::ArrayType;
pub use boolean::BooleanType;
pub use buffer::BufferType;
pub use date::DateType;
pub use id::IdType;
pub use number::NumberType;
pub use object::ObjectType;
pub use string::StringType;
pub use virtuals::Virtual;

/// Built-in type tags recognized in schema declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    Buffer,
    Id,
}

/// A default for an absent field: either a stored value or a thunk called
/// on every substitution.
#[derive(Clone)]
pub enum DefaultValue {
    Fixed(Value),
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Fixed(v) => v.clone(),
            DefaultValue::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Fixed(value)
    }
}

/// Options shared by every schema type. Immutable once the type is
/// registered on a schema.
#[derive(Debug, Clone, Default)]
pub struct TypeOptions {
    pub required: bool,
    pub default: Option<DefaultValue>,
    /// Referenced model name, consumed by the population descriptor parser.
    pub reference: Option<String>,
}

/// A named query operator: `(type, value at path, operator argument, doc)`
/// to a pure predicate result.
pub type QueryOperator = fn(&dyn SchemaType, Option<&Value>, &Value, &Value) -> bool;

/// A named update operator: `(type, value at path, operator argument, doc,
/// path)` to the replacement value for the path, or `None` to clear it.
/// `$rename` is the one operator that writes another path through `doc`.
pub type UpdateOperator =
    fn(&dyn SchemaType, Option<&Value>, &Value, &mut Value, &str) -> Result<Option<Value>>;

/// The capability set every field type satisfies.
///
/// `cast` is the ingress transform into the in-memory form, `validate` the
/// egress transform before commit, `parse`/`export` decode and encode the
/// persisted form, and `compare`/`matches` back sorting and equality
/// queries. Named `$` operators are looked up through `query_operator` and
/// `update_operator`; unknown names are compile-time errors.
pub trait SchemaType: Send + Sync {
    fn name(&self) -> &'static str;

    fn options(&self) -> &TypeOptions;

    /// Ingress transform. `None`/null substitutes the configured default;
    /// with no default the result stays absent.
    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, self.options())
    }

    /// Egress transform before persistence. Substitutes defaults, enforces
    /// `required`, and may canonicalize. Receives the document mutably so
    /// types with write-through behavior (virtual setters) can reach
    /// sibling fields.
    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        require(resolve_missing(value, self.options()), self.options())
    }

    /// Decode the persisted form into the in-memory form.
    fn parse(&self, value: Option<&Value>) -> Option<Value> {
        value.cloned()
    }

    /// Encode the in-memory form into the persisted form. `None` removes
    /// the field from the persisted document.
    fn export(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        value.cloned()
    }

    /// Total order used by the sort compiler. Absent values sort first.
    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        value_cmp(a, b)
    }

    /// Equality-style default predicate. An absent value only matches a
    /// null query.
    fn matches(&self, value: Option<&Value>, query: &Value, _doc: &Value) -> bool {
        match value {
            Some(v) => v == query,
            None => query.is_null(),
        }
    }

    fn query_operator(&self, name: &str) -> Option<QueryOperator> {
        base_query_operator(name)
    }

    fn update_operator(&self, name: &str) -> Option<UpdateOperator> {
        base_update_operator(name)
    }

    /// Referenced model for population. `Array` delegates to its child.
    fn reference(&self) -> Option<&str> {
        self.options().reference.as_deref()
    }
}

/// Instantiate a built-in type by tag.
pub fn builtin(kind: FieldKind, options: TypeOptions) -> Arc<dyn SchemaType> {
    match kind {
        FieldKind::String => Arc::new(StringType::new(options)),
        FieldKind::Number => Arc::new(NumberType::new(options)),
        FieldKind::Boolean => Arc::new(BooleanType::new(options)),
        FieldKind::Array => Arc::new(ArrayType::new(Arc::new(Mixed::default()), options)),
        FieldKind::Object => Arc::new(ObjectType::new(options)),
        FieldKind::Date => Arc::new(DateType::new(options)),
        FieldKind::Buffer => Arc::new(BufferType::new(options)),
        FieldKind::Id => Arc::new(IdType::new(options)),
    }
}

/// Well-known operator aliases.
pub fn canonical_operator(name: &str) -> &str {
    match name {
        "$exists" => "$exist",
        "$max" => "$lte",
        "$min" => "$gte",
        _ => name,
    }
}

/// The operator table shared by every type.
pub(crate) fn base_query_operator(name: &str) -> Option<QueryOperator> {
    let op: QueryOperator = match canonical_operator(name) {
        "$exist" => |_ty, value, query, _doc| value.is_some() == truthy(query),
        "$ne" => |ty, value, query, doc| !ty.matches(value, query, doc),
        "$lt" => |ty, value, query, _doc| {
            value.is_some() && ty.compare(value, Some(query)) == Ordering::Less
        },
        "$lte" => |ty, value, query, _doc| {
            value.is_some() && ty.compare(value, Some(query)) != Ordering::Greater
        },
        "$gt" => |ty, value, query, _doc| {
            value.is_some() && ty.compare(value, Some(query)) == Ordering::Greater
        },
        "$gte" => |ty, value, query, _doc| {
            value.is_some() && ty.compare(value, Some(query)) != Ordering::Less
        },
        "$in" => |_ty, value, query, _doc| match (value, query.as_array()) {
            (Some(v), Some(candidates)) => candidates.contains(v),
            _ => false,
        },
        "$nin" => |_ty, value, query, _doc| match (value, query.as_array()) {
            (Some(v), Some(candidates)) => !candidates.contains(v),
            _ => true,
        },
        _ => return None,
    };
    Some(op)
}

pub(crate) fn base_update_operator(name: &str) -> Option<UpdateOperator> {
    let op: UpdateOperator = match canonical_operator(name) {
        "$set" => |_ty, _value, arg, _doc, _path| Ok(Some(arg.clone())),
        "$unset" => |_ty, value, arg, _doc, _path| {
            Ok(if truthy(arg) { None } else { value.cloned() })
        },
        "$rename" => |_ty, value, arg, doc, path| {
            let target = arg.as_str().ok_or_else(|| {
                DepotError::Type("$rename expects a string path argument".into())
            })?;
            if target == path {
                return Ok(value.cloned());
            }
            if let Some(v) = value {
                crate::path::set(doc, target, v.clone())?;
            }
            Ok(None)
        },
        _ => return None,
    };
    Some(op)
}

/// Fallback type synthesized on the fly for paths the schema does not
/// declare: default equality, default comparison, base operators only.
#[derive(Debug, Default)]
pub struct Mixed {
    options: TypeOptions,
}

impl Mixed {
    pub fn new(options: TypeOptions) -> Self {
        Mixed { options }
    }
}

impl SchemaType for Mixed {
    fn name(&self) -> &'static str {
        "Mixed"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }
}

/// Substitute the default for an absent or null value.
pub(crate) fn resolve_missing(value: Option<&Value>, options: &TypeOptions) -> Option<Value> {
    match value {
        Some(v) if !v.is_null() => Some(v.clone()),
        _ => options.default.as_ref().map(|d| d.resolve()),
    }
}

/// Enforce `required` after default substitution.
pub(crate) fn require(value: Option<Value>, options: &TypeOptions) -> Result<Option<Value>> {
    if options.required && value.as_ref().map_or(true, |v| v.is_null()) {
        return Err(DepotError::Validation("value is required".into()));
    }
    Ok(value)
}

/// JSON truthiness as used by operator arguments and `$where` results:
/// null, false, zero, and the empty string are false.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Natural ordering over JSON values. Same-kind values compare by content;
/// mixed kinds order by type rank so the result stays total.
pub(crate) fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => value_cmp_inner(a, b),
    }
}

fn value_cmp_inner(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (ex, ey) in x.iter().zip(y.iter()) {
                let ord = value_cmp_inner(ex, ey);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
