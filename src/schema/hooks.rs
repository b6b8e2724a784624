use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;

/// Lifecycle events a hook can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Save,
    Remove,
}

/// A stored lifecycle hook. The engine only stores hooks; invocation is
/// the collection layer's job.
pub type Hook = Arc<dyn Fn(&mut Value) -> Result<()> + Send + Sync>;

/// A user-defined instance or static function, also consumed by `$where`
/// queries. Receives the document and returns a value whose truthiness
/// matters to callers that test it.
pub type Method = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Ordered hook lists for one phase (pre or post).
#[derive(Default)]
pub struct HookSet {
    pub save: Vec<Hook>,
    pub remove: Vec<Hook>,
}

impl HookSet {
    pub fn list(&self, kind: HookKind) -> &[Hook] {
        match kind {
            HookKind::Save => &self.save,
            HookKind::Remove => &self.remove,
        }
    }

    pub(crate) fn push(&mut self, kind: HookKind, hook: Hook) {
        match kind {
            HookKind::Save => self.save.push(hook),
            HookKind::Remove => self.remove.push(hook),
        }
    }
}

#[derive(Default)]
pub struct Hooks {
    pub pre: HookSet,
    pub post: HookSet,
}
