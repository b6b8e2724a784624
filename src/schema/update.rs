use crate::error::{DepotError, Result};
use crate::path;
use crate::schema::Schema;
use serde_json::{Map, Value};

pub type Mutator = Box<dyn Fn(&mut Value) -> Result<()> + Send + Sync>;

/// A compiled update: an ordered sequence of mutating actions applied to
/// a document in declaration order.
pub struct Update {
    mutators: Vec<Mutator>,
}

impl std::fmt::Debug for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("mutators", &self.mutators.len())
            .finish()
    }
}

impl Update {
    pub fn apply(&self, doc: &mut Value) -> Result<()> {
        for m in &self.mutators {
            m(doc)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }

    pub fn mutators(&self) -> &[Mutator] {
        &self.mutators
    }
}

impl Schema {
    /// Compile an update document into a sequence of mutators.
    pub fn parse_update(&self, update: &Value) -> Result<Update> {
        let obj = update
            .as_object()
            .ok_or_else(|| DepotError::Type("update must be an object".into()))?;
        let mut mutators = Vec::new();
        self.parse_update_object("", obj, &mut mutators)?;
        Ok(Update { mutators })
    }

    fn parse_update_object(
        &self,
        prefix: &str,
        obj: &Map<String, Value>,
        mutators: &mut Vec<Mutator>,
    ) -> Result<()> {
        for (key, value) in obj {
            if key.starts_with('$') {
                if prefix.is_empty() {
                    // Inline form: { $op: { field: arg, ... } }, one action
                    // per field against that field's own argument.
                    let fields = value.as_object().ok_or_else(|| {
                        DepotError::Type(format!("{key} expects an object of fields"))
                    })?;
                    for (field, arg) in fields {
                        mutators.push(self.operator_mutator(key, field, arg)?);
                    }
                } else {
                    // First-class form on a path: key: { $op: arg }.
                    mutators.push(self.operator_mutator(key, prefix, value)?);
                }
            } else {
                let target = path::join(prefix, key);
                match value {
                    Value::Object(nested) => {
                        self.parse_update_object(&target, nested, mutators)?
                    }
                    _ => {
                        let (p, v) = (target, value.clone());
                        mutators.push(Box::new(move |doc| path::set(doc, &p, v.clone())));
                    }
                }
            }
        }
        Ok(())
    }

    fn operator_mutator(&self, op_name: &str, target: &str, arg: &Value) -> Result<Mutator> {
        let ty = self.type_at(target);
        let op = ty
            .update_operator(op_name)
            .ok_or_else(|| DepotError::UnknownOperator {
                kind: "update",
                op: op_name.to_string(),
                ty: ty.name().to_string(),
            })?;
        let (p, arg) = (target.to_string(), arg.clone());
        Ok(Box::new(move |doc| {
            let current = path::get(doc, &p).cloned();
            match op(ty.as_ref(), current.as_ref(), &arg, doc, &p)? {
                Some(v) => path::set(doc, &p, v),
                None => {
                    path::delete(doc, &p);
                    Ok(())
                }
            }
        }))
    }
}
