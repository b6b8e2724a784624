use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepotError {
    #[error("Type error: {0}")]
    Type(String),

    #[error("Invalid value for schema path `{0}`")]
    InvalidDeclaration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Population error: {0}")]
    Population(String),

    #[error("Unknown {kind} operator `{op}` on type {ty}")]
    UnknownOperator {
        kind: &'static str,
        op: String,
        ty: String,
    },

    #[error("Path error: {0}")]
    Path(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DepotError>;
