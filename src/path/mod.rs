use crate::error::{DepotError, Result};
use serde_json::Value;

/// Read the value at a dotted path. Traversing through anything that is
/// not an object yields `None`.
pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write a value at a dotted path, creating missing intermediate objects.
/// Writing through an existing non-object value is an error.
pub fn set(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let mut segments = path.split('.').peekable();
    let mut current = doc;

    while let Some(segment) = segments.next() {
        let map = current.as_object_mut().ok_or_else(|| {
            DepotError::Path(format!(
                "Cannot set '{path}': '{segment}' is reached through a non-object value"
            ))
        })?;

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return Ok(());
        }

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }

    // Unreachable: split always yields at least one segment.
    Err(DepotError::Path(format!("Empty path '{path}'")))
}

/// Remove the value at a dotted path. Missing paths are a no-op; emptied
/// parent objects are preserved.
pub fn delete(doc: &mut Value, path: &str) {
    let mut segments = path.split('.').peekable();
    let mut current = doc;

    while let Some(segment) = segments.next() {
        let Some(map) = current.as_object_mut() else {
            return;
        };

        if segments.peek().is_none() {
            map.remove(segment);
            return;
        }

        match map.get_mut(segment) {
            Some(next) => current = next,
            None => return,
        }
    }
}

/// Join a path prefix and a key without producing a leading separator.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_top_level() {
        let doc = json!({"age": 30});
        assert_eq!(get(&doc, "age"), Some(&json!(30)));
        assert_eq!(get(&doc, "missing"), None);
    }

    #[test]
    fn test_get_nested() {
        let doc = json!({"name": {"first": "Jane", "last": "Doe"}});
        assert_eq!(get(&doc, "name.first"), Some(&json!("Jane")));
        assert_eq!(get(&doc, "name.middle"), None);
        assert_eq!(get(&doc, "name.first.x"), None);
    }

    #[test]
    fn test_get_through_non_object() {
        let doc = json!({"tags": ["a", "b"]});
        // Arrays are addressed as whole values, never indexed through.
        assert_eq!(get(&doc, "tags.0"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut doc = json!({});
        set(&mut doc, "a.b.c", json!(1)).unwrap();
        assert_eq!(doc, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_overwrites() {
        let mut doc = json!({"a": {"b": 1}});
        set(&mut doc, "a.b", json!(2)).unwrap();
        assert_eq!(doc, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_set_through_non_object_fails() {
        let mut doc = json!({"a": 1});
        assert!(set(&mut doc, "a.b", json!(2)).is_err());
    }

    #[test]
    fn test_delete_leaf_preserves_parent() {
        let mut doc = json!({"a": {"b": 1}});
        delete(&mut doc, "a.b");
        assert_eq!(doc, json!({"a": {}}));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut doc = json!({"a": 1});
        delete(&mut doc, "x.y");
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "age"), "age");
        assert_eq!(join("name", "first"), "name.first");
    }
}
