//! Evaluation errors
//!
//! Every variant describes why a parsed expression could not produce a value.
//! When one of these comes from evaluating a *submission* it is learner-facing
//! (the submitted expression is invalid even though it parsed); the same error
//! from a *reference* expression is the author's fault and must be re-labelled
//! by the grading boundary before anything reaches the learner.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow: the result is too large to represent")]
    Overflow,

    #[error("domain violation: {0}")]
    Domain(String),

    #[error("shape mismatch: cannot {op} {lhs} and {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("array of rank {rank} exceeds the allowed maximum rank of {max}")]
    RankLimit { rank: usize, max: usize },

    #[error("'{0}' is not a recognized variable or constant")]
    UndefinedName(String),

    #[error("'{0}' is not a recognized function")]
    UndefinedFunction(String),

    #[error("there was an error evaluating function {name}(...): expected {expected} inputs, but received {received}")]
    FunctionArity {
        name: String,
        expected: usize,
        received: usize,
    },

    #[error("there was an error evaluating function {name}(...)\n\t{report}")]
    FunctionInputs { name: String, report: String },

    #[error("expression is too deeply nested to evaluate")]
    TooDeep,
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn domain(msg: impl Into<String>) -> Self {
        EvalError::Domain(msg.into())
    }

    pub fn shape(op: &'static str, lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        EvalError::ShapeMismatch { op, lhs: lhs.into(), rhs: rhs.into() }
    }
}

/// For n < 4, the correct ordinal; otherwise `nth`. Matches the wording used
/// in function-input reports.
pub fn low_ordinal(n: usize) -> String {
    match n {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        other => format!("{}th", other),
    }
}
