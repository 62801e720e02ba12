//! Sampling errors
//!
//! These are configuration-level failures: they can only be caused by the
//! author's declarations, never by a learner's submission, so none of them
//! are learner-facing.

use rubric_eval::error::EvalError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("dependent samplers form a cycle: {names}")]
    Cycle { names: String },

    #[error("dependent sampler '{name}' failed to evaluate: {error}")]
    Dependent { name: String, error: EvalError },
}

pub type SampleResult<T> = Result<T, SampleError>;
