use crate::error::{DepotError, Result};
use crate::path;
use crate::schema::Schema;
use crate::types::truthy;
use serde_json::{Map, Value};

pub(crate) type QueryPred = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// A compiled query: a stack of predicates, AND-composed over the
/// document. Compiled per call; holds clones of the types it dispatches
/// through, so it stays valid for the duration of the call.
pub struct Query {
    preds: Vec<QueryPred>,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("preds", &self.preds.len())
            .finish()
    }
}

impl Query {
    pub fn matches(&self, doc: &Value) -> bool {
        self.preds.iter().all(|p| p(doc))
    }

    pub fn len(&self) -> usize {
        self.preds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }
}

fn expect_array<'a>(op: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| DepotError::Type(format!("{op} expects an array of queries")))
}

fn expect_object<'a>(op: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| DepotError::Type(format!("{op} expects an object")))
}

impl Schema {
    /// Compile a query document into a predicate over documents.
    pub fn exec_query(&self, query: &Value) -> Result<Query> {
        let obj = expect_object("query", query)?;
        Ok(Query {
            preds: self.parse_query(obj)?,
        })
    }

    fn parse_query(&self, obj: &Map<String, Value>) -> Result<Vec<QueryPred>> {
        let mut preds: Vec<QueryPred> = Vec::new();
        for (key, value) in obj {
            match key.as_str() {
                "$and" => {
                    for sub in expect_array(key, value)? {
                        preds.extend(self.parse_query(expect_object(key, sub)?)?);
                    }
                }
                "$or" => {
                    let branches = self.compile_branches(key, value)?;
                    preds.push(Box::new(move |doc| {
                        branches.iter().any(|q| q.matches(doc))
                    }));
                }
                "$nor" => {
                    let branches = self.compile_branches(key, value)?;
                    preds.push(Box::new(move |doc| {
                        !branches.iter().any(|q| q.matches(doc))
                    }));
                }
                "$not" => {
                    let inner = self.parse_query(expect_object(key, value)?)?;
                    // Passes iff any inner predicate fails.
                    preds.push(Box::new(move |doc| inner.iter().any(|p| !p(doc))));
                }
                "$where" => {
                    let name = value.as_str().ok_or_else(|| {
                        DepotError::Type(
                            "$where expects the name of a registered function".into(),
                        )
                    })?;
                    let f = self.function(name).ok_or_else(|| {
                        DepotError::Type(format!("$where references unknown function '{name}'"))
                    })?;
                    preds.push(Box::new(move |doc| truthy(&f(doc))));
                }
                _ => match value {
                    Value::Object(nested) => self.parse_normal_query(key, nested, &mut preds)?,
                    _ => preds.push(self.equality(key, value.clone())),
                },
            }
        }
        Ok(preds)
    }

    fn compile_branches(&self, op: &str, value: &Value) -> Result<Vec<Query>> {
        expect_array(op, value)?
            .iter()
            .map(|sub| {
                Ok(Query {
                    preds: self.parse_query(expect_object(op, sub)?)?,
                })
            })
            .collect()
    }

    /// Field queries under a path prefix: `$` keys dispatch to the
    /// prefix's type operators, nested objects descend, scalars compare
    /// for equality.
    fn parse_normal_query(
        &self,
        prefix: &str,
        obj: &Map<String, Value>,
        preds: &mut Vec<QueryPred>,
    ) -> Result<()> {
        for (key, value) in obj {
            if key.starts_with('$') {
                let ty = self.type_at(prefix);
                let op = ty
                    .query_operator(key)
                    .ok_or_else(|| DepotError::UnknownOperator {
                        kind: "query",
                        op: key.clone(),
                        ty: ty.name().to_string(),
                    })?;
                let (p, cond) = (prefix.to_string(), value.clone());
                preds.push(Box::new(move |doc| {
                    op(ty.as_ref(), path::get(doc, &p), &cond, doc)
                }));
            } else {
                let target = path::join(prefix, key);
                match value {
                    Value::Object(nested) => self.parse_normal_query(&target, nested, preds)?,
                    _ => preds.push(self.equality(&target, value.clone())),
                }
            }
        }
        Ok(())
    }

    fn equality(&self, name: &str, cond: Value) -> QueryPred {
        let ty = self.type_at(name);
        let p = name.to_string();
        Box::new(move |doc| ty.matches(path::get(doc, &p), &cond, doc))
    }
}
