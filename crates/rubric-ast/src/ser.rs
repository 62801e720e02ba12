//! Serialization for expression trees
//!
//! JSON only: trees are small, and JSON is what the surrounding tooling
//! (config files, verdict dumps) already speaks.

use thiserror::Error;

use crate::expr::Expr;

/// Serialization error
#[derive(Error, Debug)]
pub enum SerError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerError>;

/// Serialize an expression tree to pretty-printed JSON.
pub fn to_json(expr: &Expr) -> Result<String> {
    Ok(serde_json::to_string_pretty(expr)?)
}

/// Deserialize an expression tree from JSON.
pub fn from_json(json: &str) -> Result<Expr> {
    Ok(serde_json::from_str(json)?)
}
