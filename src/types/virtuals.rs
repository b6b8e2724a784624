use crate::error::Result;
use crate::types::{SchemaType, TypeOptions};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub type VirtualGetter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type VirtualSetter = Arc<dyn Fn(&Value, &mut Value) + Send + Sync>;

/// A computed field. The getter materializes the value from the document
/// during getter-stack application; the optional setter writes assigned
/// values through to real fields. Virtuals never persist: export always
/// removes them.
pub struct Virtual {
    options: TypeOptions,
    getter: Mutex<Option<VirtualGetter>>,
    setter: Mutex<Option<VirtualSetter>>,
}

impl Virtual {
    pub fn new() -> Self {
        Virtual {
            options: TypeOptions::default(),
            getter: Mutex::new(None),
            setter: Mutex::new(None),
        }
    }

    /// Attach the getter. Returns `self` for chaining.
    pub fn get<F>(&self, f: F) -> &Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        *self.getter.lock().unwrap() = Some(Arc::new(f));
        self
    }

    /// Attach the setter. Returns `self` for chaining.
    pub fn set<F>(&self, f: F) -> &Self
    where
        F: Fn(&Value, &mut Value) + Send + Sync + 'static,
    {
        *self.setter.lock().unwrap() = Some(Arc::new(f));
        self
    }
}

impl Default for Virtual {
    fn default() -> Self {
        Virtual::new()
    }
}

impl SchemaType for Virtual {
    fn name(&self) -> &'static str {
        "Virtual"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn cast(&self, value: Option<&Value>, doc: &Value) -> Option<Value> {
        let getter = self.getter.lock().unwrap().clone();
        match getter {
            Some(g) => Some(g(doc)),
            None => value.cloned(),
        }
    }

    /// Assigned values are written through the setter; the virtual key
    /// itself is always dropped from the commit form.
    fn validate(&self, value: Option<&Value>, doc: &mut Value) -> Result<Option<Value>> {
        let setter = self.setter.lock().unwrap().clone();
        if let (Some(s), Some(v)) = (setter, value) {
            s(v, doc);
        }
        Ok(None)
    }

    fn parse(&self, _value: Option<&Value>) -> Option<Value> {
        None
    }

    fn export(&self, _value: Option<&Value>, _doc: &Value) -> Option<Value> {
        None
    }
}
