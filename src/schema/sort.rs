use crate::error::{DepotError, Result};
use crate::path;
use crate::schema::Schema;
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub type Comparator = Box<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// A compiled sort: comparators in declaration order, combined
/// lexicographically (first non-equal wins).
pub struct Sort {
    comparators: Vec<Comparator>,
}

impl std::fmt::Debug for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sort")
            .field("comparators", &self.comparators.len())
            .finish()
    }
}

impl Sort {
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for c in &self.comparators {
            let ord = c(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn len(&self) -> usize {
        self.comparators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
    }
}

fn parse_order(name: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Number(n) if n.as_i64() == Some(1) => Ok(false),
        Value::Number(n) if n.as_i64() == Some(-1) => Ok(true),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(false),
            "desc" | "descending" => Ok(true),
            _ => Err(DepotError::Type(format!(
                "Invalid sort order '{s}' for '{name}'"
            ))),
        },
        other => Err(DepotError::Type(format!(
            "Invalid sort order {other} for '{name}'"
        ))),
    }
}

impl Schema {
    /// Compile a sort document into a total ordering over documents.
    pub fn exec_sort(&self, sort: &Value) -> Result<Sort> {
        Ok(Sort {
            comparators: self.parse_sort(sort)?,
        })
    }

    /// Compile a sort document into its comparator list.
    pub fn parse_sort(&self, sort: &Value) -> Result<Vec<Comparator>> {
        let obj = sort
            .as_object()
            .ok_or_else(|| DepotError::Type("sort must be an object".into()))?;
        let mut comparators = Vec::new();
        self.parse_sort_object("", obj, &mut comparators)?;
        Ok(comparators)
    }

    fn parse_sort_object(
        &self,
        prefix: &str,
        obj: &Map<String, Value>,
        comparators: &mut Vec<Comparator>,
    ) -> Result<()> {
        for (key, value) in obj {
            let target = path::join(prefix, key);
            match value {
                Value::Object(nested) => self.parse_sort_object(&target, nested, comparators)?,
                order => {
                    let descending = parse_order(&target, order)?;
                    let ty = self.type_at(&target);
                    let p = target.clone();
                    comparators.push(Box::new(move |a, b| {
                        let ord = ty.compare(path::get(a, &p), path::get(b, &p));
                        if descending {
                            ord.reverse()
                        } else {
                            ord
                        }
                    }));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDecl;
    use serde_json::json;

    fn person_schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .add([
                ("age", SchemaDecl::number()),
                ("name", SchemaDecl::tree([("last", SchemaDecl::string())])),
            ])
            .unwrap();
        schema
    }

    #[test]
    fn test_lexicographic_ordering() {
        let schema = person_schema();
        let sort = schema
            .exec_sort(&json!({"age": -1, "name.last": 1}))
            .unwrap();

        let mut docs = vec![
            json!({"age": 30, "name": {"last": "B"}}),
            json!({"age": 30, "name": {"last": "A"}}),
            json!({"age": 40, "name": {"last": "Z"}}),
        ];
        docs.sort_by(|a, b| sort.compare(a, b));

        assert_eq!(docs[0]["age"], json!(40));
        assert_eq!(docs[1]["name"]["last"], json!("A"));
        assert_eq!(docs[2]["name"]["last"], json!("B"));
    }

    #[test]
    fn test_nested_sort_document() {
        let schema = person_schema();
        let sort = schema.exec_sort(&json!({"name": {"last": "desc"}})).unwrap();
        assert_eq!(
            sort.compare(
                &json!({"name": {"last": "A"}}),
                &json!({"name": {"last": "B"}})
            ),
            Ordering::Greater
        );
    }

    #[test]
    fn test_string_orders() {
        let schema = person_schema();
        let asc = schema.exec_sort(&json!({"age": "asc"})).unwrap();
        let desc = schema.exec_sort(&json!({"age": "DESC"})).unwrap();
        let a = json!({"age": 1});
        let b = json!({"age": 2});
        assert_eq!(asc.compare(&a, &b), Ordering::Less);
        assert_eq!(desc.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_unknown_path_uses_fallback_comparator() {
        let schema = person_schema();
        let sort = schema.exec_sort(&json!({"score": 1})).unwrap();
        assert_eq!(
            sort.compare(&json!({"score": 1}), &json!({"score": 2})),
            Ordering::Less
        );
        // Absent values sort first.
        assert_eq!(
            sort.compare(&json!({}), &json!({"score": 0})),
            Ordering::Less
        );
    }

    #[test]
    fn test_comparator_is_consistent() {
        let schema = person_schema();
        let sort = schema.exec_sort(&json!({"age": 1})).unwrap();
        let a = json!({"age": 1});
        let b = json!({"age": 2});
        let c = json!({"age": 3});
        // Antisymmetric and transitive on these docs.
        assert_eq!(sort.compare(&a, &b), sort.compare(&b, &a).reverse());
        assert_eq!(sort.compare(&a, &b), Ordering::Less);
        assert_eq!(sort.compare(&b, &c), Ordering::Less);
        assert_eq!(sort.compare(&a, &c), Ordering::Less);
    }

    #[test]
    fn test_invalid_order_token() {
        let schema = person_schema();
        let err = schema.exec_sort(&json!({"age": 0})).unwrap_err();
        assert!(err.to_string().contains("age"));
        assert!(schema.exec_sort(&json!({"age": "sideways"})).is_err());
    }
}
