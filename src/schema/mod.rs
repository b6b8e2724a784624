use crate::error::{DepotError, Result};
use crate::path;
use crate::types::{Mixed, ObjectType, SchemaType, TypeOptions, Virtual};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub mod decl;
pub mod hooks;
pub mod populate;
pub mod query;
pub mod sort;
pub mod update;

pub use decl::{FieldDecl, SchemaDecl};
pub use hooks::{Hook, HookKind, HookSet, Hooks, Method};
pub use populate::Populate;
pub use query::Query;
pub use sort::Sort;
pub use update::Update;

pub type StackFn = Box<dyn Fn(&mut Value) -> Result<()> + Send + Sync>;

/// The four per-path pipelines. One closure per registered path in each,
/// appended in insertion order:
///
/// - `getter` inflates a loaded document into its in-memory form (cast),
/// - `setter` canonicalizes and validates before commit,
/// - `import` decodes persisted JSON values (ISO dates, hex buffers),
/// - `export` encodes to JSON-safe persisted values.
#[derive(Default)]
pub struct Stacks {
    pub getter: Vec<StackFn>,
    pub setter: Vec<StackFn>,
    pub import: Vec<StackFn>,
    pub export: Vec<StackFn>,
}

impl Stacks {
    fn push(&mut self, name: &str, ty: &Arc<dyn SchemaType>) {
        let (p, t) = (name.to_string(), ty.clone());
        self.getter.push(Box::new(move |doc| {
            let value = path::get(doc, &p).cloned();
            if let Some(cast) = t.cast(value.as_ref(), doc) {
                path::set(doc, &p, cast)?;
            }
            Ok(())
        }));

        let (p, t) = (name.to_string(), ty.clone());
        self.setter.push(Box::new(move |doc| {
            let value = path::get(doc, &p).cloned();
            match t.validate(value.as_ref(), doc) {
                Ok(Some(out)) => path::set(doc, &p, out),
                Ok(None) => {
                    path::delete(doc, &p);
                    Ok(())
                }
                Err(DepotError::Validation(msg)) => {
                    Err(DepotError::Validation(format!("Field '{p}': {msg}")))
                }
                Err(e) => Err(e),
            }
        }));

        let (p, t) = (name.to_string(), ty.clone());
        self.import.push(Box::new(move |doc| {
            let value = path::get(doc, &p).cloned();
            if let Some(parsed) = t.parse(value.as_ref()) {
                path::set(doc, &p, parsed)?;
            }
            Ok(())
        }));

        let (p, t) = (name.to_string(), ty.clone());
        self.export.push(Box::new(move |doc| {
            let value = path::get(doc, &p).cloned();
            match t.export(value.as_ref(), doc) {
                Some(out) => path::set(doc, &p, out),
                None => {
                    path::delete(doc, &p);
                    Ok(())
                }
            }
        }));
    }

    /// Stack length; all four stacks always have the same length.
    pub fn len(&self) -> usize {
        self.getter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.getter.is_empty()
    }
}

/// A compiled schema: the path-to-type registry, the four pipelines, and
/// the hook/method registries. Built once at startup by `add` calls;
/// read-mostly afterwards.
pub struct Schema {
    paths: HashMap<String, Arc<dyn SchemaType>>,
    stacks: Stacks,
    hooks: Hooks,
    methods: HashMap<String, Method>,
    statics: HashMap<String, Method>,
}

impl Schema {
    pub fn new() -> Self {
        Schema {
            paths: HashMap::new(),
            stacks: Stacks::default(),
            hooks: Hooks::default(),
            methods: HashMap::new(),
            statics: HashMap::new(),
        }
    }

    /// Construct a schema from a declaration tree.
    pub fn with<K, I>(declarations: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaDecl)>,
    {
        let mut schema = Schema::new();
        schema.add(declarations)?;
        Ok(schema)
    }

    /// Install every declaration of a tree, in declaration order.
    pub fn add<K, I>(&mut self, declarations: I) -> Result<()>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaDecl)>,
    {
        for (name, decl) in declarations {
            self.add_path(&name.into(), decl)?;
        }
        Ok(())
    }

    /// Install a single typed path. Nested trees materialize a synthetic
    /// `Object` parent before their children, so stack order follows a
    /// preorder traversal of the declaration.
    pub fn add_path(&mut self, name: &str, decl: SchemaDecl) -> Result<()> {
        if name.is_empty() {
            return Err(DepotError::InvalidDeclaration(name.to_string()));
        }
        match decl {
            SchemaDecl::Tree(children) => {
                self.install(name, Arc::new(ObjectType::new(TypeOptions::default())));
                for (key, child) in children {
                    self.add_path(&path::join(name, &key), child)?;
                }
                Ok(())
            }
            leaf => {
                let ty = leaf.into_type();
                self.install(name, ty);
                Ok(())
            }
        }
    }

    fn install(&mut self, name: &str, ty: Arc<dyn SchemaType>) {
        log::debug!("registered schema path '{name}' ({})", ty.name());
        self.stacks.push(name, &ty);
        self.paths.insert(name.to_string(), ty);
    }

    /// The type registered at a path, if any.
    pub fn path(&self, name: &str) -> Option<&Arc<dyn SchemaType>> {
        self.paths.get(name)
    }

    pub fn paths(&self) -> &HashMap<String, Arc<dyn SchemaType>> {
        &self.paths
    }

    pub fn stacks(&self) -> &Stacks {
        &self.stacks
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn methods(&self) -> &HashMap<String, Method> {
        &self.methods
    }

    pub fn statics(&self) -> &HashMap<String, Method> {
        &self.statics
    }

    /// Register a computed path. Returns the virtual so a getter and
    /// setter can be chained onto it.
    pub fn add_virtual(&mut self, name: &str) -> Result<Arc<Virtual>> {
        if name.is_empty() {
            return Err(DepotError::InvalidDeclaration(name.to_string()));
        }
        let v = Arc::new(Virtual::new());
        self.install(name, v.clone());
        Ok(v)
    }

    /// Register a hook to run before a lifecycle event.
    pub fn pre<F>(&mut self, kind: HookKind, f: F)
    where
        F: Fn(&mut Value) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.pre.push(kind, Arc::new(f));
    }

    /// Register a hook to run after a lifecycle event.
    pub fn post<F>(&mut self, kind: HookKind, f: F)
    where
        F: Fn(&mut Value) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.post.push(kind, Arc::new(f));
    }

    /// Register an instance method.
    pub fn method<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(DepotError::Type("Method name is required".into()));
        }
        self.methods.insert(name.to_string(), Arc::new(f));
        Ok(())
    }

    /// Register a static (model-level) method.
    pub fn static_method<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(DepotError::Type("Method name is required".into()));
        }
        self.statics.insert(name.to_string(), Arc::new(f));
        Ok(())
    }

    /// Inflate a loaded document into its in-memory form.
    pub fn apply_getters(&self, doc: &mut Value) -> Result<()> {
        for f in &self.stacks.getter {
            f(doc)?;
        }
        Ok(())
    }

    /// Canonicalize and validate a document before commit.
    pub fn apply_setters(&self, doc: &mut Value) -> Result<()> {
        for f in &self.stacks.setter {
            f(doc)?;
        }
        Ok(())
    }

    /// Decode persisted JSON values into runtime values.
    pub fn parse_database(&self, doc: &mut Value) -> Result<()> {
        for f in &self.stacks.import {
            f(doc)?;
        }
        Ok(())
    }

    /// Encode runtime values into JSON-safe persisted values. Virtual
    /// paths are removed.
    pub fn export_database(&self, doc: &mut Value) -> Result<()> {
        for f in &self.stacks.export {
            f(doc)?;
        }
        Ok(())
    }

    /// The type at a path, or a synthesized fallback for undeclared paths.
    pub(crate) fn type_at(&self, name: &str) -> Arc<dyn SchemaType> {
        match self.paths.get(name) {
            Some(ty) => ty.clone(),
            None => Arc::new(Mixed::default()),
        }
    }

    /// A registered function by name, instance methods first.
    pub(crate) fn function(&self, name: &str) -> Option<Method> {
        self.methods
            .get(name)
            .or_else(|| self.statics.get(name))
            .cloned()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldKind;
    use serde_json::json;

    fn person_schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .add([
                ("age", SchemaDecl::number()),
                (
                    "name",
                    SchemaDecl::tree([
                        ("first", SchemaDecl::string()),
                        (
                            "last",
                            FieldDecl::new(FieldKind::String)
                                .default_value(json!("Doe"))
                                .into(),
                        ),
                    ]),
                ),
            ])
            .unwrap();
        schema
    }

    #[test]
    fn test_stack_length_matches_path_count() {
        let schema = person_schema();
        // age, name, name.first, name.last
        assert_eq!(schema.paths().len(), 4);
        assert_eq!(schema.stacks().len(), 4);
        assert_eq!(schema.stacks().getter.len(), schema.stacks().setter.len());
        assert_eq!(schema.stacks().import.len(), schema.stacks().export.len());
    }

    #[test]
    fn test_nested_tree_materializes_object_parent() {
        let schema = person_schema();
        assert_eq!(schema.path("name").unwrap().name(), "Object");
        assert_eq!(schema.path("name.first").unwrap().name(), "String");
        assert_eq!(schema.path("name.last").unwrap().name(), "String");
    }

    #[test]
    fn test_setter_then_export_applies_defaults() {
        let schema = person_schema();
        let mut doc = json!({"age": 30, "name": {"first": "Jane"}});
        schema.apply_setters(&mut doc).unwrap();
        schema.export_database(&mut doc).unwrap();
        assert_eq!(
            doc,
            json!({"age": 30, "name": {"first": "Jane", "last": "Doe"}})
        );
    }

    #[test]
    fn test_required_field_fails_setters() {
        let mut schema = Schema::new();
        schema
            .add([(
                "email",
                SchemaDecl::from(FieldDecl::new(FieldKind::String).required()),
            )])
            .unwrap();
        let mut doc = json!({});
        let err = schema.apply_setters(&mut doc).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_import_export_round_trip() {
        let mut schema = Schema::new();
        schema
            .add([
                ("created", SchemaDecl::date()),
                ("payload", SchemaDecl::buffer()),
            ])
            .unwrap();

        let mut doc = json!({
            "created": "2020-01-01T00:00:00.000Z",
            "payload": "deadbeef",
        });
        schema.apply_getters(&mut doc).unwrap();
        let in_memory = doc.clone();

        schema.export_database(&mut doc).unwrap();
        assert_eq!(doc["created"], json!("2020-01-01T00:00:00.000Z"));
        assert_eq!(doc["payload"], json!("deadbeef"));

        schema.parse_database(&mut doc).unwrap();
        assert_eq!(doc, in_memory);
    }

    #[test]
    fn test_getter_substitutes_defaults() {
        let mut schema = Schema::new();
        schema
            .add([(
                "role",
                SchemaDecl::from(FieldDecl::new(FieldKind::String).default_value(json!("member"))),
            )])
            .unwrap();
        let mut doc = json!({});
        schema.apply_getters(&mut doc).unwrap();
        assert_eq!(doc["role"], json!("member"));
    }

    #[test]
    fn test_virtual_is_computed_and_never_exported() {
        let mut schema = person_schema();
        schema
            .add_virtual("full")
            .unwrap()
            .get(|doc| {
                json!(format!(
                    "{} {}",
                    doc["name"]["first"].as_str().unwrap_or(""),
                    doc["name"]["last"].as_str().unwrap_or("")
                ))
            });

        let mut doc = json!({"age": 30, "name": {"first": "Jane", "last": "Doe"}});
        schema.apply_getters(&mut doc).unwrap();
        assert_eq!(doc["full"], json!("Jane Doe"));

        schema.export_database(&mut doc).unwrap();
        assert!(doc.get("full").is_none());
    }

    #[test]
    fn test_virtual_setter_writes_through() {
        let mut schema = person_schema();
        schema.add_virtual("full").unwrap().set(|value, doc| {
            if let Some((first, last)) = value.as_str().and_then(|s| s.split_once(' ')) {
                doc["name"] = json!({"first": first, "last": last});
            }
        });

        let mut doc = json!({"age": 30, "full": "Jane Smith"});
        schema.apply_setters(&mut doc).unwrap();
        assert_eq!(doc["name"]["first"], json!("Jane"));
        assert_eq!(doc["name"]["last"], json!("Smith"));
        assert!(doc.get("full").is_none());
    }

    #[test]
    fn test_empty_path_name_is_invalid() {
        let mut schema = Schema::new();
        let err = schema.add_path("", SchemaDecl::string()).unwrap_err();
        assert!(matches!(err, DepotError::InvalidDeclaration(_)));
    }

    #[test]
    fn test_method_registration() {
        let mut schema = Schema::new();
        schema.method("adult", |doc| json!(doc["age"].as_i64().unwrap_or(0) >= 18)).unwrap();
        assert!(schema.methods().contains_key("adult"));
        assert!(matches!(
            schema.method("", |_| json!(null)).unwrap_err(),
            DepotError::Type(_)
        ));
    }

    #[test]
    fn test_hook_registration() {
        let mut schema = Schema::new();
        schema.pre(HookKind::Save, |doc| {
            doc["touched"] = json!(true);
            Ok(())
        });
        schema.post(HookKind::Remove, |_| Ok(()));

        assert_eq!(schema.hooks().pre.list(HookKind::Save).len(), 1);
        assert_eq!(schema.hooks().post.list(HookKind::Remove).len(), 1);

        // Stored hooks are runnable by the collection layer.
        let mut doc = json!({});
        (schema.hooks().pre.list(HookKind::Save)[0])(&mut doc).unwrap();
        assert_eq!(doc["touched"], json!(true));
    }
}
