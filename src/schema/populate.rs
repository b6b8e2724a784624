use crate::error::{DepotError, Result};
use crate::schema::Schema;
use serde::Serialize;
use serde_json::{Map, Value};

/// A resolved population descriptor: which path to populate and from
/// which model. Reference resolution itself is the population executor's
/// job; the engine only normalizes the expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Populate {
    pub path: String,
    pub model: String,
    /// Unrecognized option keys, passed through to the executor.
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Schema {
    /// Normalize a populate expression into an ordered descriptor list.
    /// Accepted forms: a whitespace-separated path string, a list of
    /// strings or option mappings, or a single option mapping.
    pub fn parse_populate(&self, expr: &Value) -> Result<Vec<Populate>> {
        match expr {
            Value::String(s) => s
                .split_whitespace()
                .map(|name| self.populate_by_name(name))
                .collect(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => self.populate_by_name(s),
                    Value::Object(obj) => self.populate_item(obj),
                    other => Err(DepotError::Population(format!(
                        "invalid populate expression: {other}"
                    ))),
                })
                .collect(),
            Value::Object(obj) => Ok(vec![self.populate_item(obj)?]),
            other => Err(DepotError::Population(format!(
                "invalid populate expression: {other}"
            ))),
        }
    }

    fn populate_by_name(&self, name: &str) -> Result<Populate> {
        let model = self
            .reference_for(name)
            .ok_or_else(|| DepotError::Population("model is required".into()))?;
        Ok(Populate {
            path: name.to_string(),
            model,
            extras: Map::new(),
        })
    }

    fn populate_item(&self, obj: &Map<String, Value>) -> Result<Populate> {
        let path = obj
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| DepotError::Population("path is required".into()))?;

        let model = match obj.get("model").and_then(Value::as_str) {
            Some(m) => m.to_string(),
            None => self
                .reference_for(path)
                .ok_or_else(|| DepotError::Population("model is required".into()))?,
        };

        let extras = obj
            .iter()
            .filter(|(k, _)| *k != "path" && *k != "model")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Populate {
            path: path.to_string(),
            model,
            extras,
        })
    }

    fn reference_for(&self, name: &str) -> Option<String> {
        self.path(name)
            .and_then(|ty| ty.reference().map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDecl, SchemaDecl};
    use crate::types::FieldKind;
    use serde_json::json;

    fn post_schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .add([
                (
                    "author",
                    SchemaDecl::from(FieldDecl::new(FieldKind::Id).reference("User")),
                ),
                (
                    "comments",
                    SchemaDecl::list([FieldDecl::new(FieldKind::Id).reference("Comment").into()]),
                ),
                ("tags", SchemaDecl::list([SchemaDecl::string()])),
            ])
            .unwrap();
        schema
    }

    #[test]
    fn test_string_form_splits_on_whitespace() {
        let schema = post_schema();
        let descriptors = schema.parse_populate(&json!("author comments")).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].path, "author");
        assert_eq!(descriptors[0].model, "User");
        assert_eq!(descriptors[1].path, "comments");
        assert_eq!(descriptors[1].model, "Comment");
    }

    #[test]
    fn test_list_of_strings() {
        let schema = post_schema();
        let descriptors = schema
            .parse_populate(&json!(["comments", "author"]))
            .unwrap();
        assert_eq!(descriptors[0].model, "Comment");
        assert_eq!(descriptors[1].model, "User");
    }

    #[test]
    fn test_single_mapping_with_explicit_model() {
        let schema = post_schema();
        let descriptors = schema
            .parse_populate(&json!({"path": "author", "model": "Admin"}))
            .unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].model, "Admin");
    }

    #[test]
    fn test_extras_are_preserved() {
        let schema = post_schema();
        let descriptors = schema
            .parse_populate(&json!([{"path": "author", "select": ["name"]}]))
            .unwrap();
        assert_eq!(descriptors[0].extras.get("select"), Some(&json!(["name"])));
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let schema = post_schema();
        let err = schema.parse_populate(&json!([{"path": "tags"}])).unwrap_err();
        assert!(matches!(err, DepotError::Population(ref m) if m == "model is required"));
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let schema = post_schema();
        let err = schema
            .parse_populate(&json!([{"model": "User"}]))
            .unwrap_err();
        assert!(matches!(err, DepotError::Population(ref m) if m == "path is required"));
    }

    #[test]
    fn test_invalid_expression() {
        let schema = post_schema();
        assert!(schema.parse_populate(&json!(42)).is_err());
        assert!(schema.parse_populate(&json!([42])).is_err());
    }
}
