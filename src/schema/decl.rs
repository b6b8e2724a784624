use crate::types::{builtin, ArrayType, DefaultValue, FieldKind, Mixed, ObjectType, SchemaType, TypeOptions};
use serde_json::Value;
use std::sync::Arc;

/// A schema declaration for one path. Declarations form a tree: plain
/// nested mappings materialize synthetic `Object` parents, ordered
/// sequences compile to `Array` types parameterized by their first
/// element.
pub enum SchemaDecl {
    /// A ready type instance (built-in or user-defined).
    Type(Arc<dyn SchemaType>),
    /// A bare built-in tag, equivalent to a `Field` with default options.
    Kind(FieldKind),
    /// A built-in tag plus options.
    Field(FieldDecl),
    /// Ordered-sequence form: an array of the first element's type.
    List(Vec<SchemaDecl>),
    /// Plain nested mapping: a synthetic `Object` parent plus child paths.
    Tree(Vec<(String, SchemaDecl)>),
}

impl SchemaDecl {
    pub fn string() -> Self {
        SchemaDecl::Kind(FieldKind::String)
    }

    pub fn number() -> Self {
        SchemaDecl::Kind(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        SchemaDecl::Kind(FieldKind::Boolean)
    }

    pub fn date() -> Self {
        SchemaDecl::Kind(FieldKind::Date)
    }

    pub fn buffer() -> Self {
        SchemaDecl::Kind(FieldKind::Buffer)
    }

    pub fn id() -> Self {
        SchemaDecl::Kind(FieldKind::Id)
    }

    pub fn object() -> Self {
        SchemaDecl::Kind(FieldKind::Object)
    }

    pub fn tree<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaDecl)>,
    {
        SchemaDecl::Tree(entries.into_iter().map(|(k, d)| (k.into(), d)).collect())
    }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = SchemaDecl>,
    {
        SchemaDecl::List(items.into_iter().collect())
    }

    /// Compile a declaration used as an array child. Grouping trees inside
    /// arrays collapse to plain objects: array elements are handled whole,
    /// so no child paths are registered for them.
    pub(crate) fn into_type(self) -> Arc<dyn SchemaType> {
        match self {
            SchemaDecl::Type(ty) => ty,
            SchemaDecl::Kind(kind) => builtin(kind, TypeOptions::default()),
            SchemaDecl::Field(field) => field.build(),
            SchemaDecl::List(mut items) => {
                let child = if items.is_empty() {
                    Arc::new(Mixed::default()) as Arc<dyn SchemaType>
                } else {
                    items.remove(0).into_type()
                };
                Arc::new(ArrayType::new(child, TypeOptions::default()))
            }
            SchemaDecl::Tree(_) => Arc::new(ObjectType::new(TypeOptions::default())),
        }
    }
}

impl From<FieldKind> for SchemaDecl {
    fn from(kind: FieldKind) -> Self {
        SchemaDecl::Kind(kind)
    }
}

impl From<FieldDecl> for SchemaDecl {
    fn from(field: FieldDecl) -> Self {
        SchemaDecl::Field(field)
    }
}

impl From<Arc<dyn SchemaType>> for SchemaDecl {
    fn from(ty: Arc<dyn SchemaType>) -> Self {
        SchemaDecl::Type(ty)
    }
}

/// A built-in tag plus options: the `{ type: T, ... }` declaration form.
pub struct FieldDecl {
    kind: FieldKind,
    required: bool,
    default: Option<DefaultValue>,
    reference: Option<String>,
    child: Option<Box<SchemaDecl>>,
}

impl FieldDecl {
    pub fn new(kind: FieldKind) -> Self {
        FieldDecl {
            kind,
            required: false,
            default: None,
            reference: None,
            child: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Fixed(value));
        self
    }

    pub fn default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }

    /// Referenced model name, used by population.
    pub fn reference(mut self, model: impl Into<String>) -> Self {
        self.reference = Some(model.into());
        self
    }

    /// Element declaration for `Array` fields.
    pub fn child(mut self, decl: SchemaDecl) -> Self {
        self.child = Some(Box::new(decl));
        self
    }

    pub(crate) fn build(self) -> Arc<dyn SchemaType> {
        let options = TypeOptions {
            required: self.required,
            default: self.default,
            reference: self.reference,
        };
        match self.kind {
            FieldKind::Array => {
                let child = match self.child {
                    Some(decl) => decl.into_type(),
                    None => Arc::new(Mixed::default()) as Arc<dyn SchemaType>,
                };
                Arc::new(ArrayType::new(child, options))
            }
            kind => builtin(kind, options),
        }
    }
}
