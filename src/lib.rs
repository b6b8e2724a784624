pub mod error;
pub mod path;
pub mod schema;
pub mod types;

pub use error::{DepotError, Result};
pub use schema::{
    FieldDecl, HookKind, Populate, Query, Schema, SchemaDecl, Sort, Update,
};
pub use types::{FieldKind, SchemaType, TypeOptions};
